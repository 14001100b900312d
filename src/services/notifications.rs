//! Notification fan-out for settled order groups.
//!
//! Every dispatch attempt runs inside its own error boundary: a failing
//! channel is logged and recorded in the report, and the remaining attempts
//! continue. Nothing in this module can fail the settlement that triggered
//! it, and nothing is retried.

use crate::{
    config::AppConfig,
    entities::{address, order},
    services::email::EmailDispatcher,
    services::razorpay::PaymentDetails,
    services::sms::SmsDispatcher,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Everything the notification bodies need about one settled order, resolved
/// ahead of time so dispatch itself stays free of database access.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    pub order: order::Model,
    pub saree_name: String,
    pub delivery_address: Option<address::Model>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

/// Notification channels fanned out after settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    AdminEmail,
    CustomerEmail,
    AdminSms,
    CustomerSms,
}

/// Outcome of a single dispatch attempt.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationAttempt {
    pub channel: Channel,
    pub recipient: String,
    pub ok: bool,
}

/// Log-only aggregation of every attempt made for one order group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationReport {
    pub attempts: Vec<NotificationAttempt>,
}

impl NotificationReport {
    fn record(&mut self, channel: Channel, recipient: &str, ok: bool) {
        self.attempts.push(NotificationAttempt {
            channel,
            recipient: recipient.to_string(),
            ok,
        });
    }

    pub fn sent(&self) -> usize {
        self.attempts.iter().filter(|a| a.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.iter().filter(|a| !a.ok).count()
    }
}

/// Fan-out service over the injected email and SMS dispatchers.
#[derive(Clone)]
pub struct NotificationService {
    email: Arc<dyn EmailDispatcher>,
    sms: Arc<dyn SmsDispatcher>,
    config: Arc<AppConfig>,
}

impl NotificationService {
    pub fn new(
        email: Arc<dyn EmailDispatcher>,
        sms: Arc<dyn SmsDispatcher>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self { email, sms, config }
    }

    /// Dispatches the full set of notifications for a settled order group:
    /// one admin email, one customer email per order, and (when SMS is
    /// enabled) one admin SMS plus one customer SMS per order.
    #[instrument(skip_all, fields(orders = receipts.len()))]
    pub async fn notify_order_group(
        &self,
        receipts: &[OrderReceipt],
        payment: Option<&PaymentDetails>,
    ) -> NotificationReport {
        let mut report = NotificationReport::default();
        if receipts.is_empty() {
            return report;
        }

        self.send_admin_email(receipts, &mut report).await;

        for receipt in receipts {
            self.send_customer_email(receipt, payment, &mut report).await;
        }

        if self.config.enable_sms {
            self.send_admin_sms(receipts, &mut report).await;
            for receipt in receipts {
                self.send_customer_sms(receipt, &mut report).await;
            }
        }

        info!(
            sent = report.sent(),
            failed = report.failed(),
            "notification fan-out complete"
        );
        report
    }

    async fn send_admin_email(&self, receipts: &[OrderReceipt], report: &mut NotificationReport) {
        let Some(admin_email) = self.config.admin_email.clone() else {
            warn!("admin_email not configured; skipping admin order notification");
            return;
        };

        let references = order_references(receipts);
        let subject = format!("[{}] New Order(s) #{}", self.config.site_name, references);
        let body = self.admin_email_body(receipts);

        let ok = match self.email.send(&subject, &body, &[admin_email.clone()]).await {
            Ok(()) => true,
            Err(e) => {
                error!("admin order notification email failed: {}", e);
                false
            }
        };
        report.record(Channel::AdminEmail, &admin_email, ok);
    }

    async fn send_customer_email(
        &self,
        receipt: &OrderReceipt,
        payment: Option<&PaymentDetails>,
        report: &mut NotificationReport,
    ) {
        let reference = receipt.order.reference();
        let Some(customer_email) = receipt.customer_email.clone() else {
            warn!(order = %reference, "order has no customer email; skipping confirmation");
            return;
        };

        let subject = format!("Order Confirmation & Receipt - Order #{}", reference);
        let body = self.customer_email_body(receipt, payment);

        let ok = match self
            .email
            .send(&subject, &body, &[customer_email.clone()])
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(order = %reference, "customer confirmation email failed: {}", e);
                false
            }
        };
        report.record(Channel::CustomerEmail, &customer_email, ok);
    }

    async fn send_admin_sms(&self, receipts: &[OrderReceipt], report: &mut NotificationReport) {
        let Some(admin_phone) = self.config.admin_phone.clone() else {
            warn!("admin_phone not configured; skipping admin order SMS");
            return;
        };

        let body = self.admin_sms_body(receipts);
        let ok = self.sms.send(&admin_phone, &body).await;
        if !ok {
            error!("admin order SMS failed");
        }
        report.record(Channel::AdminSms, &admin_phone, ok);
    }

    async fn send_customer_sms(&self, receipt: &OrderReceipt, report: &mut NotificationReport) {
        // Skipped silently when no phone number is resolvable.
        let Some(phone) = receipt.customer_phone.clone() else {
            return;
        };

        let body = self.customer_sms_body(receipt);
        let ok = self.sms.send(&phone, &body).await;
        if !ok {
            error!(order = %receipt.order.reference(), "customer order SMS failed");
        }
        report.record(Channel::CustomerSms, &phone, ok);
    }

    fn admin_email_body(&self, receipts: &[OrderReceipt]) -> String {
        let first = &receipts[0];
        let total: i64 = receipts.iter().map(|r| r.order.amount).sum();

        let mut lines = vec![
            format!("New order(s): {}", order_references(receipts)),
            String::new(),
            "Customer details:".to_string(),
        ];

        if let Some(addr) = &first.delivery_address {
            lines.push(format!("Name: {}", addr.full_name));
            lines.push(format!("Phone: {}", addr.phone));
            lines.push(format!("Address: {}", address_first_line(addr)));
            lines.push(format!("{}, {} - {}", addr.city, addr.state, addr.pincode));
            lines.push(String::new());
        } else {
            lines.push(format!("Customer: {}", first.customer_name));
        }

        lines.push("Items:".to_string());
        for receipt in receipts {
            lines.push(format!(
                "- {} (x{}): Rs.{}",
                receipt.saree_name, receipt.order.quantity, receipt.order.amount
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total amount: Rs.{}", total));
        lines.push(format!(
            "Payment ID: {}",
            first
                .order
                .razorpay_payment_id
                .as_deref()
                .unwrap_or("N/A")
        ));
        lines.push(String::new());
        lines.push(format!("Admin panel: {}/admin/", self.config.site_url));
        lines.push(String::new());
        lines.push("Regards,".to_string());
        lines.push(self.config.site_name.clone());

        lines.join("\n")
    }

    fn customer_email_body(
        &self,
        receipt: &OrderReceipt,
        payment: Option<&PaymentDetails>,
    ) -> String {
        let order = &receipt.order;
        let mut lines = vec![
            format!("Hello {},", receipt.customer_name),
            String::new(),
            format!(
                "Thank you for your order #{}. Details below:",
                order.reference()
            ),
            String::new(),
            format!("Item: {}", receipt.saree_name),
            format!("Quantity: {}", order.quantity),
            format!("Amount: Rs.{}", order.amount),
            String::new(),
            format!(
                "Payment ID: {}",
                order.razorpay_payment_id.as_deref().unwrap_or("N/A")
            ),
        ];

        if let Some(details) = payment {
            lines.push(format!(
                "Amount (INR): {}",
                details
                    .amount
                    .map(|paise| (paise / 100).to_string())
                    .unwrap_or_else(|| order.amount.to_string())
            ));
            lines.push(format!(
                "Method: {}",
                details.method.as_deref().unwrap_or("N/A")
            ));
            lines.push(format!(
                "Status: {}",
                details.status.as_deref().unwrap_or("N/A")
            ));
            lines.push(format!(
                "Created at (epoch): {}",
                details
                    .created_at
                    .map(|ts| ts.to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            ));
        }
        lines.push(String::new());

        if let Some(addr) = &receipt.delivery_address {
            lines.push("Delivery Address:".to_string());
            lines.push(addr.full_name.clone());
            lines.push(address_first_line(addr));
            lines.push(format!("{}, {} - {}", addr.city, addr.state, addr.pincode));
            lines.push(String::new());
        }

        lines.push("We will pack & ship soon. For queries reply to this email.".to_string());
        lines.push(String::new());
        lines.push("Regards,".to_string());
        lines.push(self.config.site_name.clone());

        lines.join("\n")
    }

    fn admin_sms_body(&self, receipts: &[OrderReceipt]) -> String {
        let first = &receipts[0];
        let total: i64 = receipts.iter().map(|r| r.order.amount).sum();
        let items = receipts
            .iter()
            .map(|r| format!("{} (x{})", r.saree_name, r.order.quantity))
            .collect::<Vec<_>>()
            .join(", ");

        match &first.delivery_address {
            Some(addr) => format!(
                "NEW ORDER #{}\n{}, {}\n{}, {} - {}\nItems: {}\nAmount: Rs.{}",
                first.order.reference(),
                addr.full_name,
                addr.phone,
                address_first_line(addr),
                addr.city,
                addr.pincode,
                items,
                total
            ),
            None => format!(
                "NEW ORDER #{}\n{}\nItems: {}\nAmount: Rs.{}",
                first.order.reference(),
                first.customer_name,
                items,
                total
            ),
        }
    }

    fn customer_sms_body(&self, receipt: &OrderReceipt) -> String {
        format!(
            "Dear {}, your order #{} for Rs.{} is confirmed. We'll pack & ship soon. \
             Tracking details will be sent once dispatched. - {}",
            receipt.customer_name,
            receipt.order.reference(),
            receipt.order.amount,
            self.config.site_name
        )
    }
}

fn order_references(receipts: &[OrderReceipt]) -> String {
    receipts
        .iter()
        .map(|r| r.order.reference())
        .collect::<Vec<_>>()
        .join(", ")
}

fn address_first_line(addr: &address::Model) -> String {
    match addr.address_line_2.as_deref().filter(|l| !l.is_empty()) {
        Some(line2) => format!("{}, {}", addr.address_line_1, line2),
        None => addr.address_line_1.clone(),
    }
}
