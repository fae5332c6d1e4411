use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dispatch_common::Money;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
/// The fulfilment lifecycle of an order. Orders progress strictly forwards, with `Cancelled`
/// reachable from any non-terminal state. The dispatch engine only ever reads `Ready` orders and
/// performs the single `Ready` → `OutForDelivery` transition; everything else is driven by
/// checkout and vendor-side fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Created by checkout. No vendor has confirmed it yet.
    Pending,
    /// The vendor has acknowledged the order.
    Confirmed,
    /// The vendor is preparing the order.
    Processing,
    /// Packed and waiting for a rider. Eligible for broadcast and acceptance.
    Ready,
    /// A rider holds the order. Set in the same atomic write that assigns the rider.
    OutForDelivery,
    /// Terminal.
    Delivered,
    /// Terminal.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    /// Whether the state machine permits moving from `self` to `next`. Self-transitions are not
    /// permitted.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        match (*self, next) {
            (Pending, Confirmed) |
            (Confirmed, Processing) |
            (Processing, Ready) |
            (Ready, OutForDelivery) |
            (OutForDelivery, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            (_, _) => false,
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Confirmed => write!(f, "Confirmed"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Ready => write!(f, "Ready"),
            OrderStatusType::OutForDelivery => write!(f, "OutForDelivery"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Processing" => Ok(Self::Processing),
            "Ready" => Ok(Self::Ready),
            "OutForDelivery" => Ok(Self::OutForDelivery),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    RequestStatus    ---------------------------------------------------------
/// The lifecycle of a single assignment request (one rider offered one order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RequestStatus {
    /// The rider has been notified and has not responded.
    Pending,
    /// The rider accepted and holds the order. At most one request per order is ever `Accepted`.
    Accepted,
    /// The rider declined explicitly.
    Rejected,
    /// Another rider won the order, or a sweep timed the request out.
    Expired,
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "Pending"),
            RequestStatus::Accepted => write!(f, "Accepted"),
            RequestStatus::Rejected => write!(f, "Rejected"),
            RequestStatus::Expired => write!(f, "Expired"),
        }
    }
}

impl From<String> for RequestStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid request status: {value}. But this conversion cannot fail. Defaulting to Pending");
            RequestStatus::Pending
        })
    }
}

impl FromStr for RequestStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "Rejected" => Ok(Self::Rejected),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid request status: {s}"))),
        }
    }
}

//--------------------------------------       OrderId       ---------------------------------------------------------
/// The human-facing order number, as assigned at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       RiderId       ---------------------------------------------------------
/// A lightweight wrapper around a rider's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct RiderId(pub String);

impl Display for RiderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for RiderId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl RiderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      VendorId       ---------------------------------------------------------
/// A lightweight wrapper around a vendor's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct VendorId(pub String);

impl Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for VendorId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl VendorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderId,
    pub customer_id: String,
    pub status: OrderStatusType,
    pub total_price: Money,
    pub currency: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub postcode: String,
    /// Null until an accept succeeds. Never reverts to null once set.
    pub rider_id: Option<RiderId>,
    /// Set exactly once, in the same write that sets `rider_id`.
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_assignable(&self) -> bool {
        self.status == OrderStatusType::Ready && self.rider_id.is_none()
    }

    /// The delivery address assembled line by line, for push payloads and display.
    pub fn address_lines(&self) -> Vec<String> {
        let mut lines = vec![self.address_line1.clone()];
        if let Some(l2) = &self.address_line2 {
            if !l2.is_empty() {
                lines.push(l2.clone());
            }
        }
        lines.push(self.city.clone());
        lines.push(self.postcode.clone());
        lines
    }
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// The fields checkout supplies when an order enters the store. Checkout itself is out of scope
/// for the engine; this type exists for seeding and for the upstream services that own order
/// creation.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderId,
    pub customer_id: String,
    pub status: OrderStatusType,
    pub total_price: Money,
    pub currency: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new(order_number: OrderId, customer_id: String, total_price: Money) -> Self {
        Self {
            order_number,
            customer_id,
            status: OrderStatusType::Pending,
            total_price,
            currency: dispatch_common::DEFAULT_CURRENCY_CODE.to_string(),
            address_line1: String::new(),
            address_line2: None,
            city: String::new(),
            postcode: String::new(),
            items: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = status;
        self
    }

    pub fn with_item(mut self, vendor_id: VendorId, product_id: &str, quantity: i64, unit_price: Money) -> Self {
        self.items.push(NewOrderItem { vendor_id, product_id: product_id.to_string(), quantity, unit_price });
        self
    }

    pub fn with_address(mut self, line1: &str, line2: Option<&str>, city: &str, postcode: &str) -> Self {
        self.address_line1 = line1.to_string();
        self.address_line2 = line2.map(String::from);
        self.city = city.to_string();
        self.postcode = postcode.to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub vendor_id: VendorId,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
/// A single line item. The vendor reference is what drives dispatch: the distinct vendor set of an
/// order's items determines which riders may be offered the order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub vendor_id: VendorId,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

//--------------------------------------  AssignmentRequest  ---------------------------------------------------------
/// A record of one rider being offered one order. Owned by the order; requests have no lifecycle
/// of their own beyond the order's dispatch flow.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub id: i64,
    pub order_id: i64,
    pub rider_id: RiderId,
    pub status: RequestStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Rider        ---------------------------------------------------------
/// A delivery partner. A rider works for at most one vendor at a time; `vendor_id` is the single
/// source of truth for which orders the rider may see and claim.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Rider {
    pub id: RiderId,
    pub name: String,
    pub phone: Option<String>,
    pub vendor_id: Option<VendorId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Vendor       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// The vendor's declared maximum delivery distance in km. Defaults to 5 km when unset.
    pub service_radius_km: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewRider       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewRider {
    pub id: RiderId,
    pub name: String,
    pub phone: Option<String>,
    pub vendor_id: Option<VendorId>,
    pub is_active: bool,
}

//--------------------------------------      NewVendor      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewVendor {
    pub id: VendorId,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub service_radius_km: Option<f64>,
    pub is_active: bool,
}

impl NewVendor {
    pub fn new(id: VendorId, name: &str) -> Self {
        Self { id, name: name.to_string(), latitude: None, longitude: None, service_radius_km: None, is_active: true }
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            OrderStatusType::Pending,
            OrderStatusType::Confirmed,
            OrderStatusType::Processing,
            OrderStatusType::Ready,
            OrderStatusType::OutForDelivery,
            OrderStatusType::Delivered,
            OrderStatusType::Cancelled,
        ] {
            assert_eq!(s.to_string().parse::<OrderStatusType>().unwrap(), s);
        }
        assert!("NotAStatus".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn request_status_round_trips_through_strings() {
        for s in
            [RequestStatus::Pending, RequestStatus::Accepted, RequestStatus::Rejected, RequestStatus::Expired]
        {
            assert_eq!(s.to_string().parse::<RequestStatus>().unwrap(), s);
        }
    }

    #[test]
    fn strict_forward_progression() {
        use OrderStatusType::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(OutForDelivery));
        assert!(OutForDelivery.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Delivered));
        assert!(!OutForDelivery.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Ready));
    }

    #[test]
    fn cancellation_from_non_terminal_states_only() {
        use OrderStatusType::*;
        for s in [Pending, Confirmed, Processing, Ready, OutForDelivery] {
            assert!(s.can_transition_to(Cancelled), "{s} should be cancellable");
        }
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn address_lines_skip_empty_second_line() {
        let order = Order {
            id: 1,
            order_number: OrderId("1000".into()),
            customer_id: "cust-1".into(),
            status: OrderStatusType::Ready,
            total_price: Money::from(45_000),
            currency: "THB".into(),
            address_line1: "221B Baker St".into(),
            address_line2: None,
            city: "London".into(),
            postcode: "NW1 6XE".into(),
            rider_id: None,
            assigned_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.address_lines(), vec!["221B Baker St", "London", "NW1 6XE"]);
        assert!(order.is_assignable());
    }
}
