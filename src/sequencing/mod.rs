//! Song data and the sample-accurate sequencer that plays it.

pub mod automation;
pub mod event;
pub mod routing;
pub mod sequencer;
pub mod song;
pub mod track;

pub use automation::{AutomationEnvelope, VOLUME_PARAM_ID};
pub use event::{EventKind, SongEvent};
pub use routing::RoutingEdge;
pub use sequencer::Sequencer;
pub use song::{Song, TrackSpec};
pub use track::{Track, TrackKind};
