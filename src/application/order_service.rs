use std::sync::Arc;

use uuid::Uuid;

use crate::domain::address::{choose_checkout_address, Address};
use crate::domain::cart::CartTotals;
use crate::domain::checkout::{CheckoutFlow, CheckoutState};
use crate::domain::errors::DomainError;
use crate::domain::money::STORE_CURRENCY;
use crate::domain::order::{
    generate_order_number, ListResult, NewOrder, OrderLineInput, OrderTotals, OrderView,
};
use crate::domain::ports::{
    AddressRepository, CaptureRequest, CartRepository, OrderRepository, PaymentGateway,
};
use crate::domain::pricing::{PaymentMethod, PricingContext, ShippingMethod};

#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    pub shipping_address_id: Option<Uuid>,
    pub billing_address_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub discount_code: Option<String>,
    pub payer_email: String,
    pub notes: Option<String>,
}

pub struct OrderService<C, A, O> {
    carts: C,
    addresses: A,
    orders: O,
    gateway: Arc<dyn PaymentGateway>,
}

impl<C, A, O> OrderService<C, A, O>
where
    C: CartRepository,
    A: AddressRepository,
    O: OrderRepository,
{
    pub fn new(carts: C, addresses: A, orders: O, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            carts,
            addresses,
            orders,
            gateway,
        }
    }

    /// Runs the checkout flow to completion: resolve selections, compute the
    /// totals once, capture payment when the method requires it, and freeze
    /// the order. The totals frozen here come from the same
    /// [`CartTotals::compute`] call that produced the amount sent to the
    /// gateway, so the charged amount and the recorded total cannot diverge.
    pub fn place_order(
        &self,
        user_id: Uuid,
        cmd: PlaceOrderCommand,
    ) -> Result<OrderView, DomainError> {
        if cmd.payer_email.trim().is_empty() || !cmd.payer_email.contains('@') {
            return Err(DomainError::Validation(
                "a valid payer email is required".to_string(),
            ));
        }

        let lines = self.carts.lines_for_user(user_id)?;
        if lines.is_empty() {
            return Err(DomainError::Validation("cart is empty".to_string()));
        }

        let addresses = self.addresses.list_for_user(user_id)?;
        let shipping_address =
            resolve_address(&addresses, cmd.shipping_address_id, "shipping address")?;
        let billing_address_id = match cmd.billing_address_id {
            Some(id) => Some(resolve_address(&addresses, Some(id), "billing address")?.id),
            None => None,
        };

        let mut flow = CheckoutFlow::new();
        flow.select_address(shipping_address.id)?;
        flow.confirm_address()?;
        flow.select_payment_method(cmd.payment_method)?;

        let ctx = PricingContext {
            shipping_method: cmd.shipping_method,
            discount_code: cmd.discount_code.clone(),
            payment_method: Some(cmd.payment_method),
            region: Some(shipping_address.state.clone()),
        };
        let totals = CartTotals::compute(&lines, &ctx);
        let order_number = generate_order_number();

        flow.begin()?;

        if *flow.state() == CheckoutState::PaymentCollection {
            let outcome = self.gateway.capture(CaptureRequest {
                amount: totals.grand_total.clone(),
                currency: STORE_CURRENCY,
                description: format!("Storefront order {order_number}"),
                payer_email: cmd.payer_email.clone(),
            });
            flow.complete_capture(outcome)?;
            if let CheckoutState::Failed(failure) = flow.state() {
                return Err(failure.clone().into());
            }
        }

        let new_order = NewOrder {
            user_id,
            order_number,
            payment_method: cmd.payment_method,
            capture: flow.capture().cloned(),
            currency: STORE_CURRENCY,
            shipping_address_id: shipping_address.id,
            billing_address_id,
            totals: OrderTotals::from_cart_totals(&totals),
            components: totals.components.clone(),
            lines: lines.iter().map(OrderLineInput::from_cart_line).collect(),
            notes: cmd.notes.clone(),
        };

        match self.orders.create(new_order) {
            Ok(view) => {
                flow.complete_submission(Ok(view.id))?;
                log::info!(
                    "order {} placed for user {} ({} {})",
                    view.order_number,
                    user_id,
                    view.totals.total_amount,
                    view.currency.code()
                );
                Ok(view)
            }
            Err(e) => {
                flow.complete_submission(Err(e.to_string()))?;
                match flow.state() {
                    CheckoutState::Failed(failure) if !failure.is_retryable() => {
                        Err(failure.clone().into())
                    }
                    // No payment was captured; surface the original error so
                    // validation/server/network stay distinguishable.
                    _ => Err(e),
                }
            }
        }
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.orders.find_by_id(id)
    }

    pub fn list_orders(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.orders.list_for_user(user_id, page, limit)
    }
}

fn resolve_address<'a>(
    addresses: &'a [Address],
    selected: Option<Uuid>,
    what: &str,
) -> Result<&'a Address, DomainError> {
    if let Some(id) = selected {
        return addresses
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| DomainError::Validation(format!("{what} {id} does not exist")));
    }
    choose_checkout_address(addresses, None)
        .ok_or_else(|| DomainError::Validation(format!("no {what} on file")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::address::AddressKind;
    use crate::domain::cart::{CartLine, LinePricing};
    use crate::domain::money::Money;
    use crate::domain::ports::{CaptureOutcome, CartLineUpdate, NewCartLine};
    use chrono::Utc;
    use std::sync::Mutex;

    fn money(s: &str) -> Money {
        s.parse().expect("valid decimal")
    }

    fn sample_line() -> CartLine {
        CartLine::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "widget".to_string(),
            2,
            LinePricing::Fixed {
                unit_price: money("30.00"),
                unit_tax: money("2.40"),
            },
        )
        .expect("valid line")
    }

    fn sample_address(user_id: Uuid) -> Address {
        Address {
            id: Uuid::new_v4(),
            user_id,
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "CA".to_string(),
            postal_code: "90001".to_string(),
            country: "US".to_string(),
            kind: AddressKind::Shipping,
            is_default: true,
            created_at: Utc::now(),
        }
    }

    struct FakeCarts(Vec<CartLine>);

    impl CartRepository for FakeCarts {
        fn lines_for_user(&self, _user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
            Ok(self.0.clone())
        }
        fn add_line(&self, _: Uuid, _: NewCartLine) -> Result<Vec<CartLine>, DomainError> {
            unimplemented!("not used by these tests")
        }
        fn update_line(
            &self,
            _: Uuid,
            _: Uuid,
            _: CartLineUpdate,
        ) -> Result<Vec<CartLine>, DomainError> {
            unimplemented!("not used by these tests")
        }
        fn remove_line(&self, _: Uuid, _: Uuid) -> Result<Vec<CartLine>, DomainError> {
            unimplemented!("not used by these tests")
        }
        fn clear(&self, _: Uuid) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct FakeAddresses(Vec<Address>);

    impl AddressRepository for FakeAddresses {
        fn list_for_user(&self, _: Uuid) -> Result<Vec<Address>, DomainError> {
            Ok(self.0.clone())
        }
        fn find(&self, _: Uuid, id: Uuid) -> Result<Option<Address>, DomainError> {
            Ok(self.0.iter().find(|a| a.id == id).cloned())
        }
        fn create(
            &self,
            _: Uuid,
            _: crate::domain::address::NewAddress,
        ) -> Result<Address, DomainError> {
            unimplemented!("not used by these tests")
        }
        fn update(
            &self,
            _: Uuid,
            _: Uuid,
            _: crate::domain::address::AddressUpdate,
        ) -> Result<Address, DomainError> {
            unimplemented!("not used by these tests")
        }
        fn delete(&self, _: Uuid, _: Uuid) -> Result<Vec<Address>, DomainError> {
            unimplemented!("not used by these tests")
        }
        fn set_default(&self, _: Uuid, _: Uuid) -> Result<Address, DomainError> {
            unimplemented!("not used by these tests")
        }
    }

    struct FakeOrders {
        fail_with: Option<String>,
        created: Mutex<Vec<NewOrder>>,
    }

    impl FakeOrders {
        fn succeeding() -> Self {
            Self {
                fail_with: None,
                created: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                fail_with: Some(reason.to_string()),
                created: Mutex::new(Vec::new()),
            }
        }
    }

    impl OrderRepository for FakeOrders {
        fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
            if let Some(reason) = &self.fail_with {
                return Err(DomainError::Unavailable(reason.clone()));
            }
            let view = OrderView {
                id: Uuid::new_v4(),
                user_id: order.user_id,
                order_number: order.order_number.clone(),
                status: crate::domain::order::STATUS_PLACED.to_string(),
                payment_method: order.payment_method,
                payment_id: order.capture.as_ref().map(|c| c.payment_id.clone()),
                gateway_order_id: order
                    .capture
                    .as_ref()
                    .map(|c| c.gateway_order_id.clone()),
                currency: order.currency,
                shipping_address_id: order.shipping_address_id,
                billing_address_id: order.billing_address_id,
                totals: order.totals.clone(),
                components: order.components.clone(),
                lines: Vec::new(),
                notes: order.notes.clone(),
                created_at: Utc::now(),
            };
            self.created.lock().expect("lock").push(order);
            Ok(view)
        }

        fn find_by_id(&self, _: Uuid) -> Result<Option<OrderView>, DomainError> {
            Ok(None)
        }

        fn list_for_user(&self, _: Uuid, _: i64, _: i64) -> Result<ListResult, DomainError> {
            Ok(ListResult {
                items: Vec::new(),
                total: 0,
            })
        }
    }

    struct ApprovingGateway;

    impl PaymentGateway for ApprovingGateway {
        fn capture(&self, _: CaptureRequest) -> CaptureOutcome {
            CaptureOutcome::Captured {
                payment_id: "pay_ok".to_string(),
                gateway_order_id: "gw_ok".to_string(),
                signature: "sig_ok".to_string(),
            }
        }
    }

    struct DecliningGateway;

    impl PaymentGateway for DecliningGateway {
        fn capture(&self, _: CaptureRequest) -> CaptureOutcome {
            CaptureOutcome::Declined {
                reason: "card declined".to_string(),
            }
        }
    }

    fn command(method: PaymentMethod) -> PlaceOrderCommand {
        PlaceOrderCommand {
            shipping_address_id: None,
            billing_address_id: None,
            payment_method: method,
            shipping_method: ShippingMethod::Standard,
            discount_code: Some("SAVE10".to_string()),
            payer_email: "jo@example.com".to_string(),
            notes: None,
        }
    }

    #[test]
    fn cash_on_delivery_places_without_capture() {
        let user_id = Uuid::new_v4();
        let service = OrderService::new(
            FakeCarts(vec![sample_line()]),
            FakeAddresses(vec![sample_address(user_id)]),
            FakeOrders::succeeding(),
            Arc::new(ApprovingGateway),
        );

        let view = service
            .place_order(user_id, command(PaymentMethod::CashOnDelivery))
            .expect("order placed");
        assert!(view.payment_id.is_none());
        assert_eq!(view.status, "PLACED");
    }

    #[test]
    fn card_order_freezes_the_quoted_totals() {
        let user_id = Uuid::new_v4();
        let line = sample_line();
        let address = sample_address(user_id);
        let service = OrderService::new(
            FakeCarts(vec![line.clone()]),
            FakeAddresses(vec![address.clone()]),
            FakeOrders::succeeding(),
            Arc::new(ApprovingGateway),
        );

        let view = service
            .place_order(user_id, command(PaymentMethod::Card))
            .expect("order placed");

        // Recompute with the same inputs: the frozen totals must match
        // cent for cent.
        let ctx = PricingContext {
            shipping_method: ShippingMethod::Standard,
            discount_code: Some("SAVE10".to_string()),
            payment_method: Some(PaymentMethod::Card),
            region: Some(address.state),
        };
        let expected = CartTotals::compute(&[line], &ctx);
        assert_eq!(view.totals.subtotal, expected.subtotal);
        assert_eq!(view.totals.total_amount, expected.grand_total);
        assert_eq!(view.payment_id.as_deref(), Some("pay_ok"));
    }

    #[test]
    fn declined_capture_surfaces_payment_declined() {
        let user_id = Uuid::new_v4();
        let orders = FakeOrders::succeeding();
        let service = OrderService::new(
            FakeCarts(vec![sample_line()]),
            FakeAddresses(vec![sample_address(user_id)]),
            orders,
            Arc::new(DecliningGateway),
        );

        let err = service
            .place_order(user_id, command(PaymentMethod::Card))
            .expect_err("must fail");
        assert!(matches!(err, DomainError::PaymentDeclined { .. }));
    }

    #[test]
    fn order_failure_after_capture_keeps_payment_reference() {
        let user_id = Uuid::new_v4();
        let service = OrderService::new(
            FakeCarts(vec![sample_line()]),
            FakeAddresses(vec![sample_address(user_id)]),
            FakeOrders::failing("database unreachable"),
            Arc::new(ApprovingGateway),
        );

        let err = service
            .place_order(user_id, command(PaymentMethod::Card))
            .expect_err("must fail");
        match err {
            DomainError::OrderNotRecorded { payment_id, .. } => {
                assert_eq!(payment_id, "pay_ok");
            }
            other => panic!("expected OrderNotRecorded, got {other}"),
        }
    }

    #[test]
    fn order_failure_without_capture_is_the_original_error() {
        let user_id = Uuid::new_v4();
        let service = OrderService::new(
            FakeCarts(vec![sample_line()]),
            FakeAddresses(vec![sample_address(user_id)]),
            FakeOrders::failing("database unreachable"),
            Arc::new(ApprovingGateway),
        );

        let err = service
            .place_order(user_id, command(PaymentMethod::CashOnDelivery))
            .expect_err("must fail");
        assert!(matches!(err, DomainError::Unavailable(_)));
    }

    #[test]
    fn empty_cart_is_rejected_before_any_capture() {
        let user_id = Uuid::new_v4();
        let service = OrderService::new(
            FakeCarts(Vec::new()),
            FakeAddresses(vec![sample_address(user_id)]),
            FakeOrders::succeeding(),
            Arc::new(DecliningGateway),
        );

        let err = service
            .place_order(user_id, command(PaymentMethod::Card))
            .expect_err("must fail");
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn missing_address_is_rejected() {
        let user_id = Uuid::new_v4();
        let service = OrderService::new(
            FakeCarts(vec![sample_line()]),
            FakeAddresses(Vec::new()),
            FakeOrders::succeeding(),
            Arc::new(ApprovingGateway),
        );

        let err = service
            .place_order(user_id, command(PaymentMethod::Card))
            .expect_err("must fail");
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn stale_explicit_address_id_is_rejected() {
        let user_id = Uuid::new_v4();
        let service = OrderService::new(
            FakeCarts(vec![sample_line()]),
            FakeAddresses(vec![sample_address(user_id)]),
            FakeOrders::succeeding(),
            Arc::new(ApprovingGateway),
        );

        let mut cmd = command(PaymentMethod::Card);
        cmd.shipping_address_id = Some(Uuid::new_v4());
        let err = service.place_order(user_id, cmd).expect_err("must fail");
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
