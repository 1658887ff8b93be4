//! Domain types shared by every Pressly component.

pub mod account;
pub mod geo;
pub mod id;
pub mod producer;

pub use account::{Account, InterfaceKind, ParseEnumError, Role, UserActivity};
pub use geo::{GeoPoint, GeoPointError, LocationInput, RawCoordinate, RawGeoPoint};
pub use id::{AccountId, ParseIdError, ProducerId};
pub use producer::Producer;
