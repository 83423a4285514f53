pub mod qr;
pub mod subscription;
pub mod ticket;
pub mod user;

pub use qr::{EntityKind, EntityRef, QrPayload, QrSubject};
pub use subscription::{NewSubscription, PassType, Subscription};
pub use ticket::{NewTicket, PaymentStatus, Ticket};
pub use user::{ApprovalStatus, Profile, Role, RoleSet};
