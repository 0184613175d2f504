use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::money::{Currency, Money};
use crate::domain::order::{ListResult, NewOrder, OrderLineView, OrderTotals, OrderView, STATUS_PLACED};
use crate::domain::ports::OrderRepository;
use crate::domain::pricing::{ComponentType, PaymentComponent, PaymentMethod};
use crate::schema::{cart_lines, order_components, order_lines, orders};

use super::models::{
    NewOrderComponentRow, NewOrderLineRow, NewOrderRow, OrderComponentRow, OrderLineRow, OrderRow,
};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn component_from_row(row: OrderComponentRow) -> Result<PaymentComponent, DomainError> {
    let component_type = ComponentType::parse(&row.kind).ok_or_else(|| {
        DomainError::Internal(format!(
            "order component {} has unknown kind '{}'",
            row.id, row.kind
        ))
    })?;
    Ok(PaymentComponent {
        component_type,
        amount: Money::new(row.amount),
        label: row.label,
        is_negative: row.is_negative,
    })
}

fn view_from_rows(
    order: OrderRow,
    lines: Vec<OrderLineRow>,
    components: Vec<OrderComponentRow>,
) -> Result<OrderView, DomainError> {
    let payment_method = PaymentMethod::parse(&order.payment_method).map_err(|_| {
        DomainError::Internal(format!(
            "order {} has unknown payment method '{}'",
            order.id, order.payment_method
        ))
    })?;
    let currency = Currency::parse(&order.currency).ok_or_else(|| {
        DomainError::Internal(format!(
            "order {} has unknown currency '{}'",
            order.id, order.currency
        ))
    })?;
    Ok(OrderView {
        id: order.id,
        user_id: order.user_id,
        order_number: order.order_number,
        status: order.status,
        payment_method,
        payment_id: order.payment_id,
        gateway_order_id: order.gateway_order_id,
        currency,
        shipping_address_id: order.shipping_address_id,
        billing_address_id: order.billing_address_id,
        totals: OrderTotals {
            subtotal: Money::new(order.subtotal),
            tax_amount: Money::new(order.tax_amount),
            shipping_amount: Money::new(order.shipping_amount),
            discount_amount: Money::new(order.discount_amount),
            total_amount: Money::new(order.total_amount),
        },
        components: components
            .into_iter()
            .map(component_from_row)
            .collect::<Result<Vec<_>, _>>()?,
        lines: lines
            .into_iter()
            .map(|l| OrderLineView {
                id: l.id,
                product_id: l.product_id,
                name: l.name,
                quantity: l.quantity,
                unit_price: Money::new(l.unit_price),
                line_total: Money::new(l.line_total),
            })
            .collect(),
        notes: order.notes,
        created_at: order.created_at,
    })
}

impl OrderRepository for DieselOrderRepository {
    /// Inserts the frozen snapshot and clears the user's cart rows in a
    /// single transaction: the cart is emptied if and only if the order
    /// commits.
    fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order_id = Uuid::new_v4();
            let (payment_id, gateway_order_id, payment_signature) = match &order.capture {
                Some(receipt) => (
                    Some(receipt.payment_id.clone()),
                    Some(receipt.gateway_order_id.clone()),
                    Some(receipt.signature.clone()),
                ),
                None => (None, None, None),
            };

            let order_row: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    user_id: order.user_id,
                    order_number: order.order_number.clone(),
                    status: STATUS_PLACED.to_string(),
                    payment_method: order.payment_method.as_str().to_string(),
                    payment_id,
                    gateway_order_id,
                    payment_signature,
                    currency: order.currency.code().to_string(),
                    shipping_address_id: order.shipping_address_id,
                    billing_address_id: order.billing_address_id,
                    subtotal: order.totals.subtotal.rounded().into_inner(),
                    tax_amount: order.totals.tax_amount.rounded().into_inner(),
                    shipping_amount: order.totals.shipping_amount.rounded().into_inner(),
                    discount_amount: order.totals.discount_amount.rounded().into_inner(),
                    total_amount: order.totals.total_amount.rounded().into_inner(),
                    notes: order.notes.clone(),
                })
                .get_result(conn)?;

            let line_rows: Vec<NewOrderLineRow> = order
                .lines
                .iter()
                .map(|l| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    name: l.name.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price.rounded().into_inner(),
                    line_total: l.line_total.rounded().into_inner(),
                })
                .collect();
            diesel::insert_into(order_lines::table)
                .values(&line_rows)
                .execute(conn)?;

            let component_rows: Vec<NewOrderComponentRow> = order
                .components
                .iter()
                .enumerate()
                .map(|(position, c)| NewOrderComponentRow {
                    id: Uuid::new_v4(),
                    order_id,
                    kind: c.component_type.as_str().to_string(),
                    label: c.label.clone(),
                    amount: c.amount.rounded().into_inner(),
                    is_negative: c.is_negative,
                    position: position as i32,
                })
                .collect();
            diesel::insert_into(order_components::table)
                .values(&component_rows)
                .execute(conn)?;

            diesel::delete(cart_lines::table.filter(cart_lines::user_id.eq(order.user_id)))
                .execute(conn)?;

            let lines = order_lines::table
                .filter(order_lines::order_id.eq(order_id))
                .select(OrderLineRow::as_select())
                .load(conn)?;
            let components = order_components::table
                .filter(order_components::order_id.eq(order_id))
                .select(OrderComponentRow::as_select())
                .order(order_components::position.asc())
                .load(conn)?;
            view_from_rows(order_row, lines, components)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;
        let Some(order) = order else {
            return Ok(None);
        };

        let lines = order_lines::table
            .filter(order_lines::order_id.eq(order.id))
            .select(OrderLineRow::as_select())
            .load(&mut conn)?;
        let components = order_components::table
            .filter(order_components::order_id.eq(order.id))
            .select(OrderComponentRow::as_select())
            .order(order_components::position.asc())
            .load(&mut conn)?;

        view_from_rows(order, lines, components).map(Some)
    }

    fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::user_id.eq(user_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::user_id.eq(user_id))
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .map(|o| view_from_rows(o, vec![], vec![]))
                    .collect::<Result<Vec<_>, _>>()?,
                total,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartTotals;
    use crate::domain::catalog::{NewProduct, ProductPricing};
    use crate::domain::checkout::CaptureReceipt;
    use crate::domain::money::STORE_CURRENCY;
    use crate::domain::order::{generate_order_number, OrderLineInput};
    use crate::domain::ports::{CartRepository, CatalogRepository, NewCartLine};
    use crate::domain::pricing::{PricingContext, ShippingMethod};
    use crate::infrastructure::cart_repo::DieselCartRepository;
    use crate::infrastructure::catalog_repo::DieselCatalogRepository;
    use crate::infrastructure::test_support::setup_db;

    fn money(s: &str) -> Money {
        s.parse().expect("valid decimal")
    }

    fn seeded_cart(pool: &crate::db::DbPool, user_id: Uuid) -> Vec<crate::domain::cart::CartLine> {
        let catalog = DieselCatalogRepository::new(pool.clone());
        let carts = DieselCartRepository::new(pool.clone());
        let product = catalog
            .create_product(NewProduct {
                name: "widget".to_string(),
                description: None,
                category_id: None,
                pricing: ProductPricing::Fixed {
                    unit_price: money("30.00"),
                    tax_rate: "0.08".parse().expect("rate"),
                    unit_tax: money("2.40"),
                },
            })
            .expect("seed failed");
        carts
            .add_line(
                user_id,
                NewCartLine {
                    product_id: product.id,
                    quantity: 2,
                    custom_length: None,
                },
            )
            .expect("add failed")
    }

    fn new_order_from_cart(
        user_id: Uuid,
        lines: &[crate::domain::cart::CartLine],
        capture: Option<CaptureReceipt>,
    ) -> NewOrder {
        let ctx = PricingContext {
            shipping_method: ShippingMethod::Standard,
            discount_code: Some("SAVE10".to_string()),
            payment_method: Some(PaymentMethod::Card),
            region: Some("CA".to_string()),
        };
        let totals = CartTotals::compute(lines, &ctx);
        NewOrder {
            user_id,
            order_number: generate_order_number(),
            payment_method: PaymentMethod::Card,
            capture,
            currency: STORE_CURRENCY,
            shipping_address_id: Uuid::new_v4(),
            billing_address_id: None,
            totals: OrderTotals::from_cart_totals(&totals),
            components: totals.components.clone(),
            lines: lines.iter().map(OrderLineInput::from_cart_line).collect(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_freezes_snapshot_and_clears_cart() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let carts = DieselCartRepository::new(pool.clone());
        let user_id = Uuid::new_v4();
        let lines = seeded_cart(&pool, user_id);

        let receipt = CaptureReceipt {
            payment_id: "pay_abc".to_string(),
            gateway_order_id: "gwo_def".to_string(),
            signature: "sig_ghi".to_string(),
        };
        let view = repo
            .create(new_order_from_cart(user_id, &lines, Some(receipt)))
            .expect("create failed");

        assert_eq!(view.status, "PLACED");
        assert_eq!(view.payment_id.as_deref(), Some("pay_abc"));
        // subtotal 60.00, tax 4.80, shipping 0 (over threshold), discount 6.00
        assert_eq!(view.totals.subtotal, money("60.00"));
        assert_eq!(view.totals.tax_amount, money("4.80"));
        assert_eq!(view.totals.shipping_amount, money("0.00"));
        assert_eq!(view.totals.discount_amount, money("6.00"));
        assert_eq!(view.totals.total_amount, money("58.80"));
        assert_eq!(view.components.len(), 3);
        assert_eq!(view.lines.len(), 1);

        // The source cart was cleared in the same transaction.
        assert!(carts
            .lines_for_user(user_id)
            .expect("load failed")
            .is_empty());
    }

    #[tokio::test]
    async fn find_by_id_roundtrips_components_in_order() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = Uuid::new_v4();
        let lines = seeded_cart(&pool, user_id);

        let created = repo
            .create(new_order_from_cart(user_id, &lines, None))
            .expect("create failed");
        let found = repo
            .find_by_id(created.id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(found.order_number, created.order_number);
        assert!(found.payment_id.is_none());
        let kinds: Vec<ComponentType> = found
            .components
            .iter()
            .map(|c| c.component_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ComponentType::Tax,
                ComponentType::Shipping,
                ComponentType::Discount,
            ]
        );
        assert_eq!(found.totals.total_amount, created.totals.total_amount);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let result = repo
            .find_by_id(Uuid::new_v4())
            .expect("find should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn list_paginates_per_user() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = Uuid::new_v4();

        for _ in 0..5 {
            let lines = seeded_cart(&pool, user_id);
            repo.create(new_order_from_cart(user_id, &lines, None))
                .expect("create failed");
        }
        // Another user's order stays out of the listing.
        let other = Uuid::new_v4();
        let lines = seeded_cart(&pool, other);
        repo.create(new_order_from_cart(other, &lines, None))
            .expect("create failed");

        let page1 = repo.list_for_user(user_id, 1, 3).expect("list failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);

        let page2 = repo.list_for_user(user_id, 2, 3).expect("list failed");
        assert_eq!(page2.total, 5);
        assert_eq!(page2.items.len(), 2);
    }
}
