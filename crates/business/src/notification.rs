//! Bank-notification classification and ingestion
//!
//! Trader devices relay raw notification text from banking apps. The
//! classifier extracts the RUB amount, the card last-4 and the operation
//! direction; unparseable text is stored as-is and never an error - a
//! human can still match it against a payin later.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use advancepay_core::{BankNotification, Event, EventMetadata, OperationKind, TraderRole};
use advancepay_persistence::{BankNotificationRow, NotificationRepo, TraderRepo};
use anyhow::Context;
use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, info};

/// Known banking app packages.
const BANK_PACKAGES: &[&str] = &[
    "ru.sberbankmobile",
    "ru.sberbank.sberbankid",
    "ru.sberbank.sbbol",
    "ru.sberbank",
    "com.idamob.tinkoff.android",
    "ru.vtb24.mobilebanking.android",
    "ru.vtb.mobilebanking",
    "ru.alfabank.mobile.android",
    "ru.alfabank.oavdo.amc",
    "ru.raiffeisennews",
    "ru.rosbank.android",
    "ru.psbank.mobile",
    "ru.mobilebank.android",
    "com.openbank.app",
    "ru.otp.mobile",
    "ru.bspb.android",
    "ru.gazprombank.android",
    "com.yandex.bank",
    "ru.yoomoney.wallet",
];

/// Keywords that mark money arriving on the requisite.
/// "перевод от" must be checked before the debit list catches "перевод".
const CREDIT_KEYWORDS: &[&str] = &[
    "зачисление",
    "пополнение",
    "получен",
    "входящий",
    "поступление",
    "перевод от",
    "вам перевели",
];

/// Keywords that mark money leaving the requisite.
const DEBIT_KEYWORDS: &[&str] = &[
    "списание",
    "покупка",
    "оплата",
    "перевод",
    "снятие",
    "оплачен",
    "платеж",
];

/// Whether a package belongs to a banking app.
///
/// System packages are never bank apps even if they match a substring.
pub fn is_bank_package(package: &str) -> bool {
    if package.starts_with("com.android.") || package.starts_with("android") {
        return false;
    }
    let lower = package.to_lowercase();
    BANK_PACKAGES.contains(&package)
        || lower.contains("bank")
        || lower.contains("sber")
        || lower.contains("tinkoff")
}

/// Human bank name for a known package.
pub fn app_name_for_package(package: &str) -> Option<&'static str> {
    let lower = package.to_lowercase();
    if lower.contains("sberbank") {
        Some("Сбербанк")
    } else if lower.contains("tinkoff") {
        Some("Тинькофф")
    } else if lower.contains("vtb") {
        Some("ВТБ")
    } else if lower.contains("alfa") {
        Some("Альфа-Банк")
    } else if lower.contains("gazprom") {
        Some("Газпромбанк")
    } else if lower.contains("rosbank") {
        Some("Росбанк")
    } else if lower.contains("raiffeisen") {
        Some("Райффайзен")
    } else if lower.contains("yandex") {
        Some("Яндекс Банк")
    } else if lower.contains("yoomoney") {
        Some("ЮMoney")
    } else {
        None
    }
}

/// Parsed fields extracted from a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNotification {
    pub amount: Option<Decimal>,
    pub card_last4: Option<String>,
    pub operation: Option<OperationKind>,
}

/// Notification text classifier. Compile once, reuse for every message.
pub struct NotificationClassifier {
    amount_patterns: Vec<Regex>,
    card_patterns: Vec<Regex>,
}

impl NotificationClassifier {
    pub fn new() -> Self {
        // Amounts appear either as "12 345,67 ₽" (currency suffix) or
        // after a marker word ("Сумма: 500"). Thousands groups may be
        // separated by a space or NBSP; kopecks by comma or dot.
        let amount_patterns = vec![
            Regex::new(
                "(\\d{1,3}(?:[ \u{00a0}]?\\d{3})*(?:[.,]\\d{2})?)\\s*(?:₽|руб|RUB|rub)",
            )
            .expect("amount pattern"),
            Regex::new(
                "(?i)(?:сумма|на сумму|перевод|зачисление)[:\\s]+(\\d{1,3}(?:[ \u{00a0}]?\\d{3})*(?:[.,]\\d{2})?)",
            )
            .expect("amount pattern"),
            Regex::new("(\\d+(?:[.,]\\d{2})?)\\s*р\\.?(?:\\s|$)").expect("amount pattern"),
            Regex::new("(\\d+(?:[.,]\\d{2})?)\\s*рублей").expect("amount pattern"),
        ];

        let card_patterns = vec![
            Regex::new("\\*{1,4}(\\d{4})").expect("card pattern"),
            Regex::new("(?i)карт[аы]?\\s*\\*?(\\d{4})").expect("card pattern"),
            Regex::new("(\\d{4})\\s*\\*{4}").expect("card pattern"),
        ];

        Self {
            amount_patterns,
            card_patterns,
        }
    }

    /// Extract amount, card last-4 and direction from title + text.
    pub fn parse(&self, title: &str, text: &str) -> ParsedNotification {
        let full_text = format!("{} {}", title, text);
        let mut parsed = ParsedNotification::default();

        for pattern in &self.amount_patterns {
            if let Some(captures) = pattern.captures(&full_text) {
                let raw = captures[1]
                    .replace(' ', "")
                    .replace('\u{00a0}', "")
                    .replace(',', ".");
                if let Ok(amount) = Decimal::from_str(&raw) {
                    if amount > Decimal::ZERO {
                        parsed.amount = Some(amount);
                        break;
                    }
                }
            }
        }

        for pattern in &self.card_patterns {
            if let Some(captures) = pattern.captures(&full_text) {
                parsed.card_last4 = Some(captures[1].to_string());
                break;
            }
        }

        let lower = full_text.to_lowercase();
        if CREDIT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            parsed.operation = Some(OperationKind::Credit);
        } else if DEBIT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            parsed.operation = Some(OperationKind::Debit);
        }

        parsed
    }
}

impl Default for NotificationClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Notification Service - ingestion and processing state.
pub struct NotificationService<'a> {
    ctx: &'a ServiceContext,
    classifier: NotificationClassifier,
}

impl<'a> NotificationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            classifier: NotificationClassifier::new(),
        }
    }

    /// Ingest a relayed notification: classify, store, journal.
    ///
    /// Only trader devices may relay. Parsing never fails the ingest -
    /// a notification the classifier cannot read is stored raw.
    pub async fn ingest(
        &self,
        trader_id: &str,
        app_package: &str,
        title: &str,
        text: &str,
        posted_time: DateTime<Utc>,
        device_id: Option<&str>,
    ) -> BusinessResult<BankNotification> {
        let trader = TraderRepo::get_by_id(self.ctx.pool(), trader_id)
            .await
            .map_err(|_| BusinessError::TraderNotFound(trader_id.to_string()))?;

        let role = TraderRole::from_str(&trader.role)
            .ok_or_else(|| BusinessError::NotATrader(trader_id.to_string()))?;
        if !role.can_relay_notifications() {
            return Err(BusinessError::not_permitted(&trader.role, "relay_notifications").into());
        }
        if !trader.is_active {
            return Err(BusinessError::TraderNotActive(trader_id.to_string()).into());
        }

        if !is_bank_package(app_package) {
            debug!(trader_id, app_package, "relayed package is not a known bank app");
        }

        let parsed = self.classifier.parse(title, text);
        debug!(trader_id, app_package, ?parsed, "notification classified");

        let mut notification =
            BankNotification::new(trader_id, app_package, title, text, posted_time);
        notification.app_name = app_name_for_package(app_package).map(str::to_string);
        notification.amount = parsed.amount;
        notification.card_last4 = parsed.card_last4;
        notification.operation = parsed.operation;

        NotificationRepo::insert(self.ctx.pool(), &BankNotificationRow::from(&notification))
            .await
            .context("Failed to store notification")?;

        let event_id = self.ctx.next_event_id();
        let mut metadata = EventMetadata::new().with_app_package(app_package);
        if let Some(device) = device_id {
            metadata = metadata.with_device(device);
        }
        let event = Event::notification_ingested(&event_id, trader_id, &notification.id)
            .with_metadata(metadata);
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(
            trader_id,
            app_package,
            incoming = notification.is_incoming_payment(),
            "notification ingested"
        );

        Ok(notification)
    }

    /// A page of a trader's notifications, newest first.
    pub async fn list(
        &self,
        trader_id: &str,
        page: i64,
        page_size: i64,
    ) -> BusinessResult<Vec<BankNotification>> {
        let offset = (page.max(1) - 1) * page_size;
        let rows =
            NotificationRepo::get_by_trader(self.ctx.pool(), trader_id, page_size, offset)
                .await
                .map_err(BusinessError::Persistence)?;
        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            notifications.push(BankNotification::try_from(row).map_err(BusinessError::Persistence)?);
        }
        Ok(notifications)
    }

    /// Mark a notification as matched against a payin.
    pub async fn mark_processed(&self, notification_id: &str) -> BusinessResult<()> {
        NotificationRepo::mark_processed(self.ctx.pool(), notification_id)
            .await
            .map_err(BusinessError::Persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advancepay_core::Trader;
    use advancepay_persistence::{init_database, EventStore};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_parse_credit_with_ruble_sign() {
        let classifier = NotificationClassifier::new();
        let parsed = classifier.parse("Сбербанк", "Зачисление 5 000 ₽ на карту *4532");

        assert_eq!(parsed.amount, Some(dec!(5000)));
        assert_eq!(parsed.card_last4.as_deref(), Some("4532"));
        assert_eq!(parsed.operation, Some(OperationKind::Credit));
    }

    #[test]
    fn test_parse_incoming_transfer_with_kopecks() {
        let classifier = NotificationClassifier::new();
        let parsed = classifier.parse("Тинькофф", "Перевод от Иван П. 12 345,67 ₽");

        assert_eq!(parsed.amount, Some(dec!(12345.67)));
        // "перевод от" wins over the bare "перевод" debit keyword
        assert_eq!(parsed.operation, Some(OperationKind::Credit));
    }

    #[test]
    fn test_parse_debit_purchase() {
        let classifier = NotificationClassifier::new();
        let parsed = classifier.parse("ВТБ", "Покупка 1500 р. Карта *7891");

        assert_eq!(parsed.amount, Some(dec!(1500)));
        assert_eq!(parsed.card_last4.as_deref(), Some("7891"));
        assert_eq!(parsed.operation, Some(OperationKind::Debit));
    }

    #[test]
    fn test_parse_rub_suffix() {
        let classifier = NotificationClassifier::new();
        let parsed = classifier.parse("", "Списание 300.50 RUB со счёта");

        assert_eq!(parsed.amount, Some(dec!(300.50)));
        assert_eq!(parsed.operation, Some(OperationKind::Debit));
    }

    #[test]
    fn test_parse_unreadable_text() {
        let classifier = NotificationClassifier::new();
        let parsed = classifier.parse("Реклама", "Ваша персональная скидка ждёт вас");

        assert_eq!(parsed, ParsedNotification::default());
    }

    #[test]
    fn test_bank_package_detection() {
        assert!(is_bank_package("ru.sberbankmobile"));
        assert!(is_bank_package("com.idamob.tinkoff.android"));
        assert!(is_bank_package("com.some.new.bank.app"));
        assert!(!is_bank_package("com.android.systemui"));
        assert!(!is_bank_package("com.whatsapp"));
    }

    #[test]
    fn test_app_name_mapping() {
        assert_eq!(app_name_for_package("ru.sberbankmobile"), Some("Сбербанк"));
        assert_eq!(
            app_name_for_package("com.idamob.tinkoff.android"),
            Some("Тинькофф")
        );
        assert_eq!(app_name_for_package("com.unknown.app"), None);
    }

    async fn context() -> (tempfile::TempDir, ServiceContext) {
        let dir = tempdir().unwrap();
        let pool = init_database("sqlite::memory:").await.unwrap();
        let events = Arc::new(EventStore::new(dir.path()).unwrap());

        TraderRepo::insert(&pool, &Trader::trader("TRD_001", "ivan"))
            .await
            .unwrap();
        TraderRepo::insert(&pool, &Trader::team_lead("TL_001", "maria"))
            .await
            .unwrap();

        (dir, ServiceContext::from_parts(pool, events))
    }

    #[tokio::test]
    async fn test_ingest_stores_classified_notification() {
        let (_dir, ctx) = context().await;
        let service = NotificationService::new(&ctx);

        let notification = service
            .ingest(
                "TRD_001",
                "ru.sberbankmobile",
                "Сбербанк",
                "Зачисление 5 000 ₽ на карту *4532",
                Utc::now(),
                Some("device-42"),
            )
            .await
            .unwrap();

        assert_eq!(notification.app_name.as_deref(), Some("Сбербанк"));
        assert_eq!(notification.amount, Some(dec!(5000)));
        assert!(notification.is_incoming_payment());

        let listed = service.list("TRD_001", 1, 20).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_processed);

        service.mark_processed(&notification.id).await.unwrap();
        let listed = service.list("TRD_001", 1, 20).await.unwrap();
        assert!(listed[0].is_processed);
    }

    #[tokio::test]
    async fn test_only_traders_can_relay() {
        let (_dir, ctx) = context().await;
        let service = NotificationService::new(&ctx);

        let err = service
            .ingest("TL_001", "ru.sberbankmobile", "t", "x", Utc::now(), None)
            .await
            .unwrap_err();
        let cause = err.downcast_ref::<BusinessError>().unwrap();
        assert!(matches!(cause, BusinessError::OperationNotPermitted { .. }));
    }
}
