// MIDI - Wire format and device ports

pub mod device;
pub mod event;
pub mod port;

pub use device::{MidiDeviceInfo, MidiDeviceManager};
pub use event::{MidiMessage, RawMessage};
pub use port::{DevicePort, DevicePortSink, MidirInputPort, MidirOutputPort};
