//! Payment-component calculation: tax, shipping, discount, and processing
//! fee amounts with their display labels.
//!
//! Every function here is a pure function of its inputs. The same snapshot
//! of cart lines and context codes always produces the same components, so
//! the totals a user sees before submitting are exactly the totals frozen
//! into the order.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, RoundingMode, Zero};

use super::cart::CartLine;
use super::errors::DomainError;
use super::money::Money;

/// Orders at or above this subtotal ship free regardless of method.
pub fn free_shipping_threshold() -> Money {
    Money::from_minor_units(50_00)
}

/// A unitless rate expressed in basis points (250 => 0.0250).
fn rate_bps(bps: i64) -> BigDecimal {
    BigDecimal::new(BigInt::from(bps), 4)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Tax,
    Shipping,
    Discount,
    Fee,
}

impl ComponentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Tax => "TAX",
            ComponentType::Shipping => "SHIPPING",
            ComponentType::Discount => "DISCOUNT",
            ComponentType::Fee => "FEE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TAX" => Some(ComponentType::Tax),
            "SHIPPING" => Some(ComponentType::Shipping),
            "DISCOUNT" => Some(ComponentType::Discount),
            "FEE" => Some(ComponentType::Fee),
            _ => None,
        }
    }
}

/// One labeled line item contributing to an order's total.
///
/// `amount` is always non-negative; a discount is rendered as a subtraction
/// via `is_negative`, never as a negative amount.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentComponent {
    pub component_type: ComponentType,
    pub amount: Money,
    pub label: String,
    pub is_negative: bool,
}

impl PaymentComponent {
    fn new(component_type: ComponentType, amount: Money, label: String) -> Self {
        PaymentComponent {
            component_type,
            amount: amount.rounded(),
            label,
            is_negative: component_type == ComponentType::Discount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingMethod {
    Standard,
    Ground,
    Express,
    Overnight,
}

impl ShippingMethod {
    /// Case-insensitive parse. An unknown method string is a caller error,
    /// not a silent fall-through to the standard rate.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ShippingMethod::Standard),
            "ground" => Ok(ShippingMethod::Ground),
            "express" => Ok(ShippingMethod::Express),
            "overnight" => Ok(ShippingMethod::Overnight),
            other => Err(DomainError::Validation(format!(
                "unknown shipping method '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Ground => "ground",
            ShippingMethod::Express => "express",
            ShippingMethod::Overnight => "overnight",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ShippingMethod::Standard => "Standard",
            ShippingMethod::Ground => "Ground",
            ShippingMethod::Express => "Express",
            ShippingMethod::Overnight => "Overnight",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ShippingMethod::Standard => "5-7 business days",
            ShippingMethod::Ground => "5-8 business days",
            ShippingMethod::Express => "2-3 business days",
            ShippingMethod::Overnight => "Next business day",
        }
    }

    fn rate(self) -> Money {
        match self {
            ShippingMethod::Standard | ShippingMethod::Ground => Money::from_minor_units(9_99),
            ShippingMethod::Express | ShippingMethod::Overnight => Money::from_minor_units(19_99),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    InternationalCard,
    Upi,
    NetBanking,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(PaymentMethod::Card),
            "international_card" => Ok(PaymentMethod::InternationalCard),
            "upi" => Ok(PaymentMethod::Upi),
            "net_banking" => Ok(PaymentMethod::NetBanking),
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            other => Err(DomainError::Validation(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::InternationalCard => "international_card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "net_banking",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }

    /// Whether paying with this method involves an external capture step
    /// before the order can be submitted.
    pub fn requires_capture(self) -> bool {
        !matches!(self, PaymentMethod::CashOnDelivery)
    }
}

/// The context codes a checkout render supplies alongside the cart snapshot.
#[derive(Debug, Clone)]
pub struct PricingContext {
    pub shipping_method: ShippingMethod,
    pub discount_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub region: Option<String>,
}

impl Default for PricingContext {
    fn default() -> Self {
        PricingContext {
            shipping_method: ShippingMethod::Standard,
            discount_code: None,
            payment_method: None,
            region: None,
        }
    }
}

/// Tax over the cart snapshot.
///
/// A variable-dimension line's rate already includes tax, so it contributes
/// its full amount to the base and nothing to the tax component. Fixed lines
/// contribute their precomputed per-unit tax times quantity. The label shows
/// the effective rate (tax / base), or the tax-inclusive wording when every
/// line is variable-dimension.
pub fn calculate_tax(lines: &[CartLine], region: Option<&str>) -> PaymentComponent {
    let mut base = Money::zero();
    let mut tax = Money::zero();
    let mut saw_fixed = false;

    for line in lines {
        base += &line.base_amount();
        let line_tax = line.tax_amount();
        if !line.is_tax_inclusive() {
            saw_fixed = true;
        }
        tax += &line_tax;
    }

    let all_inclusive = !lines.is_empty() && !saw_fixed;
    let label = if all_inclusive {
        "Tax included in pricing".to_string()
    } else {
        let percent = effective_rate_percent(&tax, &base);
        match region {
            Some(region) => format!("Tax ({region} {percent}%)"),
            None => format!("Tax ({percent}%)"),
        }
    };

    PaymentComponent::new(ComponentType::Tax, tax, label)
}

fn effective_rate_percent(tax: &Money, base: &Money) -> BigDecimal {
    if base.is_zero() {
        return BigDecimal::zero().with_scale(2);
    }
    ((tax.amount() / base.amount()) * BigDecimal::from(100))
        .with_scale_round(2, RoundingMode::HalfUp)
}

/// Shipping for the given method: free at or above the threshold, otherwise
/// a fixed per-method rate. The free state is still a component so the FREE
/// messaging reaches the user.
pub fn calculate_shipping(subtotal: &Money, method: ShippingMethod) -> PaymentComponent {
    if *subtotal >= free_shipping_threshold() {
        return PaymentComponent::new(
            ComponentType::Shipping,
            Money::zero(),
            format!("Free Shipping ({})", method.description()),
        );
    }
    PaymentComponent::new(
        ComponentType::Shipping,
        method.rate(),
        format!("{} Shipping ({})", method.display_name(), method.description()),
    )
}

/// Static promotional table, looked up case-insensitively. Unknown or blank
/// codes are a no-op, not an error; there is no expiry, usage limit, or
/// stacking.
pub fn calculate_discount(subtotal: &Money, code: &str) -> Option<PaymentComponent> {
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return None;
    }

    let (amount, label) = match code.as_str() {
        "SAVE10" => (
            subtotal.times_rate(&rate_bps(1000)),
            format!("{code} (10% off)"),
        ),
        "SAVE20" => (
            subtotal.times_rate(&rate_bps(2000)),
            format!("{code} (20% off)"),
        ),
        "WELCOME5" => {
            // A flat discount never exceeds the subtotal.
            let flat = Money::from_minor_units(5_00);
            let amount = if flat > *subtotal { subtotal.clone() } else { flat };
            (amount, format!("{code} (5.00 off)"))
        }
        _ => return None,
    };

    let amount = amount.rounded();
    if amount.is_zero() {
        return None;
    }
    Some(PaymentComponent::new(ComponentType::Discount, amount, label))
}

/// Payment-method surcharges: a flat cash-handling fee for collect-on
/// -delivery and a percentage for international cards. Everything else is
/// free and yields no component.
pub fn calculate_processing_fee(
    subtotal: &Money,
    method: PaymentMethod,
) -> Option<PaymentComponent> {
    let (amount, label) = match method {
        PaymentMethod::CashOnDelivery => (
            Money::from_minor_units(4_99),
            "Cash handling fee".to_string(),
        ),
        PaymentMethod::InternationalCard => (
            subtotal.times_rate(&rate_bps(250)),
            "International card processing fee (2.5%)".to_string(),
        ),
        _ => return None,
    };

    let amount = amount.rounded();
    if amount.is_zero() {
        return None;
    }
    Some(PaymentComponent::new(ComponentType::Fee, amount, label))
}

/// All components for one checkout render.
///
/// Tax and shipping are always present (shipping even when free). Discount
/// and fee appear only when a non-blank code or a payment method was
/// supplied and the resulting amount is non-zero.
pub fn calculate_components(lines: &[CartLine], ctx: &PricingContext) -> Vec<PaymentComponent> {
    let subtotal: Money = lines
        .iter()
        .fold(Money::zero(), |mut acc, line| {
            acc += &line.base_amount();
            acc
        })
        .rounded();

    let mut components = vec![
        calculate_tax(lines, ctx.region.as_deref()),
        calculate_shipping(&subtotal, ctx.shipping_method),
    ];

    if let Some(code) = ctx.discount_code.as_deref() {
        if let Some(discount) = calculate_discount(&subtotal, code) {
            components.push(discount);
        }
    }

    if let Some(method) = ctx.payment_method {
        if let Some(fee) = calculate_processing_fee(&subtotal, method) {
            components.push(fee);
        }
    }

    components
}
