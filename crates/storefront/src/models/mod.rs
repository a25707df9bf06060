//! Domain models for storefront.

pub mod checkout;
pub mod notice;
pub mod order;
pub mod session;

pub use checkout::{CheckoutIntent, CheckoutLine, CheckoutQuote, CustomerDetails, PaymentSession};
pub use notice::{Notice, NoticeLevel};
pub use order::{Order, OrderItem, OrderProduct, ProductImage, TrackedOrder, TrackingUpdate};
pub use session::keys as session_keys;
pub use session::{CustomerIdentity, OpenPayment};
