// MIDI devices - Port enumeration and lookup through midir

use crate::error::{Result, SequencerError};
use midir::{MidiIO, MidiInput, MidiOutput};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiDeviceInfo {
    pub index: usize,
    pub name: String,
}

pub struct MidiDeviceManager {
    client_name: String,
}

impl MidiDeviceManager {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// List every MIDI input port
    pub fn list_input_ports(&self) -> Result<Vec<MidiDeviceInfo>> {
        let midi_in = self.input_client()?;
        Ok(describe_ports(&midi_in))
    }

    /// List every MIDI output port
    pub fn list_output_ports(&self) -> Result<Vec<MidiDeviceInfo>> {
        let midi_out = self.output_client()?;
        Ok(describe_ports(&midi_out))
    }

    pub(crate) fn input_client(&self) -> Result<MidiInput> {
        MidiInput::new(&format!("{} Input", self.client_name))
            .map_err(|e| SequencerError::Device(format!("MIDI input init failed: {}", e)))
    }

    pub(crate) fn output_client(&self) -> Result<MidiOutput> {
        MidiOutput::new(&format!("{} Output", self.client_name))
            .map_err(|e| SequencerError::Device(format!("MIDI output init failed: {}", e)))
    }
}

impl Default for MidiDeviceManager {
    fn default() -> Self {
        Self::new("MyMusic Sequencer")
    }
}

fn describe_ports<T: MidiIO>(client: &T) -> Vec<MidiDeviceInfo> {
    client
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            client
                .port_name(port)
                .ok()
                .map(|name| MidiDeviceInfo { index, name })
        })
        .collect()
}

/// Find a port by exact name, or the first port when `name` is `None`
pub(crate) fn find_port<T: MidiIO>(client: &T, name: Option<&str>) -> Result<(T::Port, String)> {
    let ports = client.ports();
    let found = match name {
        Some(wanted) => ports
            .into_iter()
            .find(|port| client.port_name(port).is_ok_and(|n| n == wanted)),
        None => ports.into_iter().next(),
    };

    let port = found.ok_or_else(|| match name {
        Some(wanted) => SequencerError::Device(format!("MIDI port '{}' not found", wanted)),
        None => SequencerError::Device("No MIDI port available".to_string()),
    })?;
    let port_name = client
        .port_name(&port)
        .unwrap_or_else(|_| "Unknown".to_string());
    Ok((port, port_name))
}
