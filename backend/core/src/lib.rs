pub mod error;
pub mod record;
pub mod traits;

pub use error::TagScanError;
pub use record::{
    is_unknown, ConsolidatedRecord, DueStatus, EquipmentNumbers, InspectionDate,
    ServiceCompany, ServiceDetails, DEFAULT_DUE_SOON_DAYS, UNKNOWN,
};
pub use traits::{VisionProvider, VisionRequest, VisionResponse};
