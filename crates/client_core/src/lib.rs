//! Client core for the logistics admin console: authenticated backend access
//! and the order list view-model.

pub mod gateway;
pub mod notice;
pub mod projection;
pub mod session;
pub mod view_model;

pub use gateway::{HttpGateway, OrderGateway};
pub use notice::{Notice, NoticeKind};
pub use projection::OrderRow;
pub use session::{Session, SessionError};
pub use view_model::{
    IgnoredReason, OrderListSnapshot, OrderListViewModel, SubmitOutcome, ViewModelConfig,
};
