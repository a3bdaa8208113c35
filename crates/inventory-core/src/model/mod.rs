pub mod device;
pub mod meta;
pub mod resource;
pub mod snapshot;

pub use device::{Device, DeviceSpec, DeviceStatus};
pub use meta::{generate_uid, ObjectMeta, API_VERSION, SCHEMA_VERSION};
pub use resource::{Resource, ResourceKind};
pub use snapshot::{DiscoverySnapshot, SnapshotPhase, SnapshotSpec, SnapshotStatus};
