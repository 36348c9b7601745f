pub mod user;
pub mod booking;
pub mod invoice;
pub mod listing;

pub use user::{Membership, MembershipType, ProfileStatus, Role, User};
pub use booking::{
    BookingKind, BookingRequest, BookingStatus, CancellationDetails, DiscountDetails,
    RouteDetails, TripType,
};
pub use invoice::{Invoice, InvoiceDirection, InvoiceStatus, InvoiceType, LineItem};
pub use listing::FlightListing;
