//! Payment-result reconciliation.
//!
//! Runs once per load of the payment-return route. The callback's query
//! string names the provider; the payment is verified with that provider,
//! and only on success is the stored [`PendingOrderIntent`] turned into an
//! order and deleted. Every failure leaves the intent in place so the
//! customer is never silently charged without an order.
//!
//! Order creation is guarded by the intent's in-flight marker: the marker is
//! written (and persisted) before the order call, and a repeated success
//! callback that finds it - a refresh of the result page, a double redirect -
//! makes no second order call.

use tracing::{instrument, warn};

use crate::commerce::types::{CreateOrderFromCart, Order, TransactionInfo};
use crate::commerce::{CommerceClient, CommerceError};
use crate::payment::{
    PROVIDER_RETURN_PARAM, PaymentError, PaymentProvider, PaymentStatus, VnpayGateway,
    ZalopayGateway,
};

use super::intent::{IntentStore, IntentStoreError, PendingOrderIntent};

/// `vnp_ResponseCode` value that means the payment completed.
pub const VNPAY_SUCCESS_CODE: &str = "00";

/// Fallback message when a provider reports failure without a reason.
const PAYMENT_FAILED_MESSAGE: &str = "Thanh toán thất bại";

/// Message when a ZaloPay return has no stored token to verify with.
const MISSING_TOKEN_MESSAGE: &str = "Không tìm thấy thông tin thanh toán";

/// The provider callback, parsed from the return route's query string.
#[derive(Debug, Clone)]
pub struct ProviderReturn {
    provider: PaymentProvider,
    params: Vec<(String, String)>,
}

impl ProviderReturn {
    /// Classify a callback by its query parameters.
    ///
    /// ZaloPay returns are marked with `paymentMethod=zalopay` (or ZaloPay's
    /// own `apptransid` parameter); everything else is treated as VNPay,
    /// whose callbacks carry `vnp_*` parameters.
    #[must_use]
    pub fn from_query(params: Vec<(String, String)>) -> Self {
        let is_zalopay = params.iter().any(|(key, value)| {
            (key == PROVIDER_RETURN_PARAM && value == "zalopay") || key == "apptransid"
        });
        let provider = if is_zalopay {
            PaymentProvider::Zalopay
        } else {
            PaymentProvider::Vnpay
        };
        Self { provider, params }
    }

    #[must_use]
    pub const fn provider(&self) -> PaymentProvider {
        self.provider
    }

    /// Look up a single callback parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All callback parameters, for pass-through verification.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// VNPay's authoritative result code.
    #[must_use]
    pub fn vnp_response_code(&self) -> Option<&str> {
        self.param("vnp_ResponseCode")
    }
}

/// Provider-specific transaction metadata merged into the order request.
#[derive(Debug, Clone, Default)]
struct TransactionMeta {
    transaction_id: Option<String>,
    bank_code: Option<String>,
    pay_date: Option<String>,
    message: Option<String>,
}

/// Verifies payments with the provider bridges.
///
/// Seam for the reconciler so its exactly-once behavior is testable without
/// live providers.
pub trait PaymentVerifier {
    /// Corroborate a VNPay callback with the bridge's verify endpoint.
    fn verify_vnpay(
        &self,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<PaymentStatus, PaymentError>> + Send;

    /// Query a ZaloPay payment's final state by token.
    fn query_zalopay(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<PaymentStatus, PaymentError>> + Send;
}

/// The two provider bridges together.
pub struct Gateways<'a> {
    pub vnpay: &'a VnpayGateway,
    pub zalopay: &'a ZalopayGateway,
}

impl PaymentVerifier for Gateways<'_> {
    async fn verify_vnpay(
        &self,
        params: &[(String, String)],
    ) -> Result<PaymentStatus, PaymentError> {
        self.vnpay.verify_return(params).await
    }

    async fn query_zalopay(&self, token: &str) -> Result<PaymentStatus, PaymentError> {
        self.zalopay.query(token).await
    }
}

/// Creates orders upstream.
///
/// Seam for the reconciler; implemented by [`CustomerOrders`] in production
/// and by counting fakes in tests.
pub trait OrderSink {
    fn create_order_from_cart(
        &self,
        request: &CreateOrderFromCart,
    ) -> impl Future<Output = Result<Order, CommerceError>> + Send;
}

/// [`OrderSink`] backed by the commerce API with the session's bearer token.
pub struct CustomerOrders<'a> {
    pub client: &'a CommerceClient,
    pub token: &'a str,
}

impl OrderSink for CustomerOrders<'_> {
    async fn create_order_from_cart(
        &self,
        request: &CreateOrderFromCart,
    ) -> Result<Order, CommerceError> {
        self.client
            .create_order_from_cart(self.token, request)
            .await
    }
}

/// Terminal state of one reconciliation pass.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Payment verified and the order exists; the intent is gone.
    OrderCreated {
        order: Order,
        transaction_id: Option<String>,
        /// Provider's own wording, shown alongside the confirmation.
        message: Option<String>,
    },
    /// A previous pass already started (or finished) order creation.
    AlreadyProcessed,
    /// The provider reported the payment as failed; intent left intact.
    PaymentFailed { message: String },
    /// Payment succeeded but no pending-order record exists.
    MissingIntent,
    /// Payment succeeded but the order endpoint refused or failed;
    /// intent left intact.
    OrderCreationFailed { message: String },
}

/// Run one reconciliation pass over a provider callback.
///
/// # Errors
///
/// Only storage failures surface as `Err`; every domain result is a
/// [`ReconcileOutcome`].
#[instrument(skip_all, fields(provider = %callback.provider()))]
pub async fn reconcile<V, S, O>(
    callback: &ProviderReturn,
    verifier: &V,
    store: &S,
    orders: &O,
) -> Result<ReconcileOutcome, IntentStoreError>
where
    V: PaymentVerifier + Sync,
    S: IntentStore + Sync,
    O: OrderSink + Sync,
{
    match callback.provider() {
        PaymentProvider::Vnpay => reconcile_vnpay(callback, verifier, store, orders).await,
        PaymentProvider::Zalopay => reconcile_zalopay(verifier, store, orders).await,
    }
}

async fn reconcile_vnpay<V, S, O>(
    callback: &ProviderReturn,
    verifier: &V,
    store: &S,
    orders: &O,
) -> Result<ReconcileOutcome, IntentStoreError>
where
    V: PaymentVerifier + Sync,
    S: IntentStore + Sync,
    O: OrderSink + Sync,
{
    // The callback's response code is the authoritative gate. The verify
    // endpoint is still consulted for the message shown to the customer,
    // but its availability must not decide the payment's fate.
    let succeeded = callback.vnp_response_code() == Some(VNPAY_SUCCESS_CODE);

    let corroboration = match verifier.verify_vnpay(callback.params()).await {
        Ok(status) => Some(status),
        Err(err) => {
            warn!("VNPay verification call failed: {err}");
            None
        }
    };

    if !succeeded {
        let message = corroboration
            .and_then(|status| status.message)
            .unwrap_or_else(|| PAYMENT_FAILED_MESSAGE.to_string());
        return Ok(ReconcileOutcome::PaymentFailed { message });
    }

    let Some(intent) = store.load().await? else {
        return Ok(ReconcileOutcome::MissingIntent);
    };

    let meta = TransactionMeta {
        transaction_id: callback.param("vnp_TransactionNo").map(str::to_string),
        bank_code: callback.param("vnp_BankCode").map(str::to_string),
        pay_date: callback.param("vnp_PayDate").map(str::to_string),
        message: corroboration.and_then(|status| status.message),
    };

    create_order_once(store, orders, intent, meta).await
}

async fn reconcile_zalopay<V, S, O>(
    verifier: &V,
    store: &S,
    orders: &O,
) -> Result<ReconcileOutcome, IntentStoreError>
where
    V: PaymentVerifier + Sync,
    S: IntentStore + Sync,
    O: OrderSink + Sync,
{
    // ZaloPay's return URL carries no verdict; the stored token is the only
    // way to learn the payment's state. Without it the payment cannot even
    // be verified, so this is a failure, not a missing-intent support case.
    let Some(intent) = store.load().await? else {
        return Ok(ReconcileOutcome::PaymentFailed {
            message: MISSING_TOKEN_MESSAGE.to_string(),
        });
    };
    let Some(token) = intent.provider_token.clone() else {
        return Ok(ReconcileOutcome::PaymentFailed {
            message: MISSING_TOKEN_MESSAGE.to_string(),
        });
    };

    let status = match verifier.query_zalopay(&token).await {
        Ok(status) => status,
        Err(err) => {
            return Ok(ReconcileOutcome::PaymentFailed {
                message: err.to_string(),
            });
        }
    };

    if !status.success {
        return Ok(ReconcileOutcome::PaymentFailed {
            message: status
                .message
                .unwrap_or_else(|| PAYMENT_FAILED_MESSAGE.to_string()),
        });
    }

    let meta = TransactionMeta {
        transaction_id: status.transaction_id,
        bank_code: None,
        pay_date: None,
        message: status.message,
    };

    create_order_once(store, orders, intent, meta).await
}

/// Turn a verified intent into an order, at most once.
async fn create_order_once<S, O>(
    store: &S,
    orders: &O,
    mut intent: PendingOrderIntent,
    meta: TransactionMeta,
) -> Result<ReconcileOutcome, IntentStoreError>
where
    S: IntentStore + Sync,
    O: OrderSink + Sync,
{
    // Persist the in-flight marker BEFORE the order call so a concurrent or
    // repeated callback cannot double-create.
    if intent
        .begin_order_creation(meta.transaction_id.clone())
        .is_err()
    {
        return Ok(ReconcileOutcome::AlreadyProcessed);
    }
    store.save(&intent).await?;

    let request = build_order_request(&intent, &meta);

    match orders.create_order_from_cart(&request).await {
        Ok(order) => {
            store.clear().await?;
            Ok(ReconcileOutcome::OrderCreated {
                order,
                transaction_id: meta.transaction_id,
                message: meta.message,
            })
        }
        Err(CommerceError::Rejected { message, .. } | CommerceError::Api { message, .. }) => {
            // Definite rejection: the order does not exist, so the customer
            // may retry from the result page.
            intent.reset_to_pending();
            store.save(&intent).await?;
            Ok(ReconcileOutcome::OrderCreationFailed { message })
        }
        Err(err) => {
            // Ambiguous failure (timeout, transport): the order may exist.
            // Keep the in-flight marker so a retry cannot double-create.
            Ok(ReconcileOutcome::OrderCreationFailed {
                message: err.to_string(),
            })
        }
    }
}

/// Merge intent fields with provider transaction metadata.
fn build_order_request(intent: &PendingOrderIntent, meta: &TransactionMeta) -> CreateOrderFromCart {
    CreateOrderFromCart {
        shipping_info_id: intent.shipping_info_id,
        payment_method: intent.payment_method,
        receive_method: intent.receive_method,
        note: intent.note.clone(),
        selected_product_ids: intent.selected_product_ids.clone(),
        transaction: Some(TransactionInfo {
            provider: intent.provider.as_str().to_string(),
            transaction_id: meta.transaction_id.clone(),
            bank_code: meta.bank_code.clone(),
            amount: intent.amount,
            pay_date: meta.pay_date.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use mobistore_core::{
        AddressId, CartLineId, OrderStatus, PaymentMethod, ReceiveMethod, Vnd,
    };

    use crate::checkout::intent::IntentState;

    use super::*;

    // =========================================================================
    // Fakes
    // =========================================================================

    struct FakeStore(Mutex<Option<PendingOrderIntent>>);

    impl FakeStore {
        fn holding(intent: Option<PendingOrderIntent>) -> Self {
            Self(Mutex::new(intent))
        }

        fn current(&self) -> Option<PendingOrderIntent> {
            self.0.lock().expect("store lock").clone()
        }
    }

    impl IntentStore for FakeStore {
        async fn load(&self) -> Result<Option<PendingOrderIntent>, IntentStoreError> {
            Ok(self.current())
        }

        async fn save(&self, intent: &PendingOrderIntent) -> Result<(), IntentStoreError> {
            *self.0.lock().expect("store lock") = Some(intent.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<(), IntentStoreError> {
            *self.0.lock().expect("store lock") = None;
            Ok(())
        }
    }

    enum SinkMode {
        Succeed,
        Reject,
        Drop,
    }

    struct FakeOrders {
        calls: AtomicUsize,
        mode: SinkMode,
    }

    impl FakeOrders {
        fn new(mode: SinkMode) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                mode,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OrderSink for FakeOrders {
        async fn create_order_from_cart(
            &self,
            request: &CreateOrderFromCart,
        ) -> Result<Order, CommerceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                SinkMode::Succeed => Ok(Order {
                    id: mobistore_core::OrderId::new(901),
                    status: OrderStatus::Pending,
                    receive_name: Some("Chị Lan".to_string()),
                    phone: None,
                    address: None,
                    payment_method: request.payment_method,
                    receive_method: request.receive_method,
                    note: Some(request.note.clone()),
                    total_price: Vnd::new(25_000),
                    order_items: Vec::new(),
                }),
                SinkMode::Reject => Err(CommerceError::Rejected {
                    code: Some(100_030),
                    message: "Sản phẩm đã hết hàng".to_string(),
                }),
                SinkMode::Drop => Err(CommerceError::Timeout),
            }
        }
    }

    struct FakeVerifier {
        vnpay: Option<PaymentStatus>,
        zalopay: Option<PaymentStatus>,
    }

    impl PaymentVerifier for FakeVerifier {
        async fn verify_vnpay(
            &self,
            _params: &[(String, String)],
        ) -> Result<PaymentStatus, PaymentError> {
            self.vnpay.clone().ok_or(PaymentError::Timeout)
        }

        async fn query_zalopay(&self, _token: &str) -> Result<PaymentStatus, PaymentError> {
            self.zalopay.clone().ok_or(PaymentError::Timeout)
        }
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn vnpay_intent() -> PendingOrderIntent {
        PendingOrderIntent {
            id: Uuid::nil(),
            shipping_info_id: Some(AddressId::new(5)),
            payment_method: PaymentMethod::BankTransfer,
            receive_method: ReceiveMethod::Delivery,
            note: String::new(),
            selected_product_ids: vec![CartLineId::new(12)],
            amount: Vnd::new(25_000),
            provider: PaymentProvider::Vnpay,
            provider_token: None,
            state: IntentState::Pending,
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    fn zalopay_intent() -> PendingOrderIntent {
        PendingOrderIntent {
            payment_method: PaymentMethod::Momo,
            provider: PaymentProvider::Zalopay,
            provider_token: Some("ACrUy98jbRSVzeb4UhoLWA".to_string()),
            ..vnpay_intent()
        }
    }

    fn vnpay_success_callback() -> ProviderReturn {
        ProviderReturn::from_query(vec![
            ("vnp_ResponseCode".to_string(), "00".to_string()),
            ("vnp_TransactionNo".to_string(), "14621370".to_string()),
            ("vnp_BankCode".to_string(), "NCB".to_string()),
            ("vnp_PayDate".to_string(), "20260806153012".to_string()),
        ])
    }

    fn verified_ok() -> FakeVerifier {
        FakeVerifier {
            vnpay: Some(PaymentStatus {
                success: true,
                message: Some("Giao dịch thành công".to_string()),
                transaction_id: Some("14621370".to_string()),
            }),
            zalopay: Some(PaymentStatus {
                success: true,
                message: Some("Giao dịch thành công".to_string()),
                transaction_id: Some("240806000001".to_string()),
            }),
        }
    }

    // =========================================================================
    // Provider detection
    // =========================================================================

    #[test]
    fn test_detects_zalopay_by_method_param() {
        let ret = ProviderReturn::from_query(vec![(
            "paymentMethod".to_string(),
            "zalopay".to_string(),
        )]);
        assert_eq!(ret.provider(), PaymentProvider::Zalopay);
    }

    #[test]
    fn test_detects_zalopay_by_apptransid() {
        let ret = ProviderReturn::from_query(vec![(
            "apptransid".to_string(),
            "240806_000123".to_string(),
        )]);
        assert_eq!(ret.provider(), PaymentProvider::Zalopay);
    }

    #[test]
    fn test_defaults_to_vnpay() {
        let ret = vnpay_success_callback();
        assert_eq!(ret.provider(), PaymentProvider::Vnpay);
        assert_eq!(ret.vnp_response_code(), Some("00"));
    }

    // =========================================================================
    // VNPay path
    // =========================================================================

    #[tokio::test]
    async fn test_vnpay_success_creates_order_and_clears_intent() {
        let store = FakeStore::holding(Some(vnpay_intent()));
        let orders = FakeOrders::new(SinkMode::Succeed);

        let outcome = reconcile(&vnpay_success_callback(), &verified_ok(), &store, &orders)
            .await
            .expect("reconcile");

        assert!(matches!(outcome, ReconcileOutcome::OrderCreated { .. }));
        assert_eq!(orders.calls(), 1);
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_vnpay_failure_code_makes_no_order_call() {
        let store = FakeStore::holding(Some(vnpay_intent()));
        let orders = FakeOrders::new(SinkMode::Succeed);
        let callback = ProviderReturn::from_query(vec![(
            "vnp_ResponseCode".to_string(),
            "24".to_string(),
        )]);

        let outcome = reconcile(&callback, &verified_ok(), &store, &orders)
            .await
            .expect("reconcile");

        assert!(matches!(outcome, ReconcileOutcome::PaymentFailed { .. }));
        assert_eq!(orders.calls(), 0);
        assert!(store.current().is_some());
    }

    #[tokio::test]
    async fn test_vnpay_success_gate_survives_verify_outage() {
        let store = FakeStore::holding(Some(vnpay_intent()));
        let orders = FakeOrders::new(SinkMode::Succeed);
        let verifier = FakeVerifier {
            vnpay: None,
            zalopay: None,
        };

        let outcome = reconcile(&vnpay_success_callback(), &verifier, &store, &orders)
            .await
            .expect("reconcile");

        // Verification is corroboration only; the response code decides.
        assert!(matches!(outcome, ReconcileOutcome::OrderCreated { .. }));
        assert_eq!(orders.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_intent_after_success_is_reported() {
        let store = FakeStore::holding(None);
        let orders = FakeOrders::new(SinkMode::Succeed);

        let outcome = reconcile(&vnpay_success_callback(), &verified_ok(), &store, &orders)
            .await
            .expect("reconcile");

        assert!(matches!(outcome, ReconcileOutcome::MissingIntent));
        assert_eq!(orders.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_success_callback_creates_one_order() {
        let store = FakeStore::holding(Some(vnpay_intent()));
        let orders = FakeOrders::new(SinkMode::Succeed);
        let callback = vnpay_success_callback();
        let verifier = verified_ok();

        let first = reconcile(&callback, &verifier, &store, &orders)
            .await
            .expect("first pass");
        assert!(matches!(first, ReconcileOutcome::OrderCreated { .. }));

        let second = reconcile(&callback, &verifier, &store, &orders)
            .await
            .expect("second pass");
        assert!(matches!(second, ReconcileOutcome::MissingIntent));

        assert_eq!(orders.calls(), 1);
    }

    #[tokio::test]
    async fn test_in_flight_intent_blocks_second_order_call() {
        let mut intent = vnpay_intent();
        intent
            .begin_order_creation(Some("14621370".to_string()))
            .expect("mark in-flight");
        let store = FakeStore::holding(Some(intent));
        let orders = FakeOrders::new(SinkMode::Succeed);

        let outcome = reconcile(&vnpay_success_callback(), &verified_ok(), &store, &orders)
            .await
            .expect("reconcile");

        assert!(matches!(outcome, ReconcileOutcome::AlreadyProcessed));
        assert_eq!(orders.calls(), 0);
    }

    #[tokio::test]
    async fn test_definite_rejection_resets_intent_for_retry() {
        let store = FakeStore::holding(Some(vnpay_intent()));
        let orders = FakeOrders::new(SinkMode::Reject);

        let outcome = reconcile(&vnpay_success_callback(), &verified_ok(), &store, &orders)
            .await
            .expect("reconcile");

        assert!(matches!(
            outcome,
            ReconcileOutcome::OrderCreationFailed { ref message } if message == "Sản phẩm đã hết hàng"
        ));
        let intent = store.current().expect("intent kept");
        assert!(!intent.is_in_flight());
    }

    #[tokio::test]
    async fn test_ambiguous_failure_keeps_in_flight_marker() {
        let store = FakeStore::holding(Some(vnpay_intent()));
        let orders = FakeOrders::new(SinkMode::Drop);

        let outcome = reconcile(&vnpay_success_callback(), &verified_ok(), &store, &orders)
            .await
            .expect("reconcile");

        assert!(matches!(outcome, ReconcileOutcome::OrderCreationFailed { .. }));
        let intent = store.current().expect("intent kept");
        assert!(intent.is_in_flight());
    }

    // =========================================================================
    // ZaloPay path
    // =========================================================================

    fn zalopay_callback() -> ProviderReturn {
        ProviderReturn::from_query(vec![(
            "paymentMethod".to_string(),
            "zalopay".to_string(),
        )])
    }

    #[tokio::test]
    async fn test_zalopay_success_creates_order_with_transaction_id() {
        let store = FakeStore::holding(Some(zalopay_intent()));
        let orders = FakeOrders::new(SinkMode::Succeed);

        let outcome = reconcile(&zalopay_callback(), &verified_ok(), &store, &orders)
            .await
            .expect("reconcile");

        match outcome {
            ReconcileOutcome::OrderCreated { transaction_id, .. } => {
                assert_eq!(transaction_id.as_deref(), Some("240806000001"));
            }
            other => panic!("expected OrderCreated, got {other:?}"),
        }
        assert_eq!(orders.calls(), 1);
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_zalopay_declined_keeps_intent() {
        let store = FakeStore::holding(Some(zalopay_intent()));
        let orders = FakeOrders::new(SinkMode::Succeed);
        let verifier = FakeVerifier {
            vnpay: None,
            zalopay: Some(PaymentStatus {
                success: false,
                message: Some("Giao dịch bị từ chối".to_string()),
                transaction_id: None,
            }),
        };

        let outcome = reconcile(&zalopay_callback(), &verifier, &store, &orders)
            .await
            .expect("reconcile");

        assert!(matches!(
            outcome,
            ReconcileOutcome::PaymentFailed { ref message } if message == "Giao dịch bị từ chối"
        ));
        assert_eq!(orders.calls(), 0);
        assert!(store.current().is_some());
    }

    #[tokio::test]
    async fn test_zalopay_without_token_cannot_verify() {
        let mut intent = zalopay_intent();
        intent.provider_token = None;
        let store = FakeStore::holding(Some(intent));
        let orders = FakeOrders::new(SinkMode::Succeed);

        let outcome = reconcile(&zalopay_callback(), &verified_ok(), &store, &orders)
            .await
            .expect("reconcile");

        assert!(matches!(
            outcome,
            ReconcileOutcome::PaymentFailed { ref message } if message == MISSING_TOKEN_MESSAGE
        ));
        assert_eq!(orders.calls(), 0);
    }

    // =========================================================================
    // Order request merging
    // =========================================================================

    #[test]
    fn test_build_order_request_merges_transaction_metadata() {
        let intent = vnpay_intent();
        let meta = TransactionMeta {
            transaction_id: Some("14621370".to_string()),
            bank_code: Some("NCB".to_string()),
            pay_date: Some("20260806153012".to_string()),
            message: None,
        };

        let request = build_order_request(&intent, &meta);

        assert_eq!(request.shipping_info_id, Some(AddressId::new(5)));
        assert_eq!(request.selected_product_ids, vec![CartLineId::new(12)]);
        let txn = request.transaction.expect("transaction attached");
        assert_eq!(txn.provider, "vnpay");
        assert_eq!(txn.transaction_id.as_deref(), Some("14621370"));
        assert_eq!(txn.bank_code.as_deref(), Some("NCB"));
        assert_eq!(txn.amount, Vnd::new(25_000));
    }
}
