//! Stockroom Core - Entity Types
//!
//! Data structures, error taxonomy, the remote backend trait and pure
//! calculators shared by every other crate. No I/O lives here.

pub mod backend;
pub mod clock;
pub mod entities;
pub mod enums;
pub mod error;
pub mod health;
pub mod identity;
pub mod quantity;
pub mod trend;

pub use backend::{InventoryBackend, InvitationRequest, StockEntryRequest, StockExitRequest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::{
    Category, CategoryUpdate, Invitation, NewCategory, NewOrganization, Organization,
    OrganizationMember, OrganizationUpdate, Product, ProductUpdate, RestockItem, RestockOutcome,
    StockMovement, Technician, TechnicianInventoryLine, TechnicianUpdate,
};
pub use enums::{InvitationStatus, MemberRole, MovementType};
pub use error::{
    RemoteError, RemoteErrorKind, StockroomError, StockroomResult, StorageError, ValidationError,
};
pub use health::{
    calculate_stock_score, stock_badge_variant, stock_score_bg_color, stock_score_color,
    stock_score_status, StockHealth,
};
pub use identity::{
    CategoryId, EntityId, EntityIdType, InvitationId, MemberId, MovementId, OrganizationId,
    ProductId, TechnicianId, Timestamp, UserId,
};
pub use quantity::Quantity;
pub use trend::{calculate_inventory_percentage, compute_trend, Trend, TrendDirection};
