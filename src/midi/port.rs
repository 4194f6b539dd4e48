// Device ports - Raw byte I/O between the sequencer and MIDI hardware

use crate::error::{Result, SequencerError};
use crate::midi::device::{MidiDeviceManager, find_port};
use crate::midi::event::RawMessage;
use crate::sequencer::event::Event;
use crate::sequencer::recorder::RecordingIngest;
use crate::sequencer::sink::ClockSink;
use midir::{MidiInputConnection, MidiOutputConnection};
use tracing::{debug, info};

/// Anything that accepts raw MIDI bytes
pub trait DevicePort: Send {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Output connection to a midir port
pub struct MidirOutputPort {
    connection: MidiOutputConnection,
    name: String,
}

impl MidirOutputPort {
    /// Connect to the named output port, or the first one if `name` is `None`
    pub fn open(devices: &MidiDeviceManager, name: Option<&str>) -> Result<Self> {
        let midi_out = devices.output_client()?;
        let (port, port_name) = find_port(&midi_out, name)?;

        let connection = midi_out
            .connect(&port, "mymusic-sequencer-output")
            .map_err(|e| SequencerError::Device(format!("MIDI output connection failed: {}", e)))?;

        info!(port = %port_name, "MIDI output connected");
        Ok(Self {
            connection,
            name: port_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl DevicePort for MidirOutputPort {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.connection
            .send(bytes)
            .map_err(|e| SequencerError::SinkDeliveryFailure(format!("{}: {}", self.name, e)))
    }
}

/// Input connection feeding a [`RecordingIngest`]
///
/// The connection stays open for as long as this value lives.
pub struct MidirInputPort {
    _connection: MidiInputConnection<()>,
    name: String,
}

impl MidirInputPort {
    pub fn open(
        devices: &MidiDeviceManager,
        name: Option<&str>,
        ingest: RecordingIngest,
    ) -> Result<Self> {
        let midi_in = devices.input_client()?;
        let (port, port_name) = find_port(&midi_in, name)?;

        // midir callback thread
        let connection = midi_in
            .connect(
                &port,
                "mymusic-sequencer-input",
                move |_timestamp, message, _| ingest.ingest(message),
                (),
            )
            .map_err(|e| SequencerError::Device(format!("MIDI input connection failed: {}", e)))?;

        info!(port = %port_name, "MIDI input connected");
        Ok(Self {
            _connection: connection,
            name: port_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Clock sink that encodes events and writes them to a device port
pub struct DevicePortSink<P: DevicePort> {
    port: P,
}

impl<P: DevicePort> DevicePortSink<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn into_inner(self) -> P {
        self.port
    }
}

impl<P: DevicePort> ClockSink for DevicePortSink<P> {
    fn emit(&mut self, event: &Event) -> Result<()> {
        let bytes = RawMessage::from(event);
        debug!(?bytes, "MIDI out");
        self.port.send(&bytes)
    }
}
