//! The zigbee module contains the cluster library side of the bridge: the
//! attribute model and store, endpoint descriptors, ZCL frame headers, the
//! report encoder, the request engine and the frame transport seam.

pub mod attribute;
pub mod command;
pub mod endpoint;
pub mod frame;
pub mod meter;
pub mod report;
pub mod store;
pub mod transport;
pub mod transport_mock;

pub use attribute::{AttributeDescriptor, AttributeKey, ZclDataType};
pub use command::{CommandEngine, FirstRunState, PeerIdentity};
pub use endpoint::{meter_endpoints, EndpointDescriptor};
pub use frame::{FrameControl, FrameType, ZclHeader};
pub use meter::{meter_attribute_store, DeviceInfo, MeasurementType};
pub use report::{encode_report, group_by_cluster, ReportEncoder, ReportSummary};
pub use store::AttributeStore;
pub use transport::{Destination, FrameTransport, InboundFrame, LogTransport, OutboundFrame};
pub use transport_mock::MockTransport;
