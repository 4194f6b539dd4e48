use mymusic_sequencer::midi::{DevicePortSink, MidiDeviceManager, MidirInputPort, MidirOutputPort};
use mymusic_sequencer::{
    Event, MusicalTime, Notification, Sequencer, SequencerConfig, TICKS_PER_QUARTER,
};
use ringbuf::traits::Consumer;
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

// How often the front-end drains notifications
const UI_REFRESH: Duration = Duration::from_millis(50);

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match SequencerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: could not load {}: {}", path, e);
                return;
            }
        },
        None => SequencerConfig::default(),
    };

    let level = config.log_level().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    println!("=== MyMusic Sequencer ===");
    println!("Version 0.1.0\n");

    let devices = MidiDeviceManager::new(config.midi.client_name.clone());
    print_ports(&devices);

    let mut sequencer = match Sequencer::new(&config) {
        Ok(sequencer) => sequencer,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return;
        }
    };
    let Some(mut notifications) = sequencer.take_notifications() else {
        return;
    };

    let track = sequencer.add_track("Recorded");
    if let Err(e) = sequencer.select_track(track) {
        eprintln!("ERROR: {}", e);
        return;
    }

    match MidirOutputPort::open(&devices, config.midi.output_port.as_deref()) {
        Ok(port) => sequencer.set_output_sink(DevicePortSink::new(port)),
        Err(e) => {
            warn!(error = %e, "No MIDI output, events will only be logged");
            sequencer.set_output_sink(|event: &Event| -> mymusic_sequencer::Result<()> {
                info!(%event, "Event due");
                Ok(())
            });
        }
    }

    // Kept alive until the end of main
    let _input = match MidirInputPort::open(
        &devices,
        config.midi.input_port.as_deref(),
        sequencer.recording_ingest(),
    ) {
        Ok(port) => Some(port),
        Err(e) => {
            warn!(error = %e, "No MIDI input, recording disabled");
            None
        }
    };

    println!("Commands: [Enter] quit, r rewind, t <bpm> tempo, l toggle loop");
    let commands = spawn_stdin_reader();

    sequencer.start_recording();
    if let Err(e) = sequencer.start() {
        eprintln!("ERROR: {}", e);
        return;
    }

    loop {
        while let Some(notification) = notifications.try_pop() {
            match notification {
                Notification::PositionChanged { tick } => {
                    let tick = tick as u64;
                    if tick % TICKS_PER_QUARTER as u64 == 0 {
                        println!("{}", MusicalTime::from_ticks(tick));
                    }
                }
                Notification::LoopWrapped { to_tick } => println!("-- loop -> {}", to_tick),
                Notification::TempoChanged { bpm } => println!("-- tempo {:.1} BPM", bpm),
                Notification::Error(report) => {
                    eprintln!("[{:?}] {}", report.category, report.message)
                }
            }
        }

        match commands.recv_timeout(UI_REFRESH) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() || line == "q" {
                    break;
                }
                handle_command(&mut sequencer, line);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    sequencer.stop_recording();
    sequencer.stop();

    if let Ok(track) = sequencer.track(track) {
        println!("\nRecorded {} events on '{}'", track.len(), track.name());
    }
}

fn print_ports(devices: &MidiDeviceManager) {
    match devices.list_input_ports() {
        Ok(ports) => {
            println!("MIDI inputs:");
            for port in ports {
                println!("  [{}] {}", port.index, port.name);
            }
        }
        Err(e) => eprintln!("Warning: {}", e),
    }
    match devices.list_output_ports() {
        Ok(ports) => {
            println!("MIDI outputs:");
            for port in ports {
                println!("  [{}] {}", port.index, port.name);
            }
        }
        Err(e) => eprintln!("Warning: {}", e),
    }
    println!();
}

fn handle_command(sequencer: &mut Sequencer, line: &str) {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("r"), _) => sequencer.rewind(),
        (Some("t"), Some(bpm)) => match bpm.parse::<f64>() {
            Ok(bpm) => {
                if let Err(e) = sequencer.set_tempo(bpm) {
                    eprintln!("{}", e);
                }
            }
            Err(_) => eprintln!("Not a number: {}", bpm),
        },
        (Some("l"), _) => {
            if sequencer.loop_window().is_none() {
                // One bar
                let bar = 4 * TICKS_PER_QUARTER as u64;
                if let Err(e) = sequencer.set_loop(0, bar) {
                    eprintln!("{}", e);
                }
            }
            sequencer.set_looping(!sequencer.is_looping());
        }
        _ => eprintln!("Unknown command: {}", line),
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
