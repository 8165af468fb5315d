//! `partybox mix`: interactive category mixer on stdin
//!
//! Audio is simulated; playheads follow the wall clock so fades, loops
//! and track ends behave as they would with real output.

use std::time::Instant;

use anyhow::{Context, Result};
use partybox_core::audio::SimulatedBackend;
use partybox_core::config::PartyConfig;
use partybox_core::keyboard::{FocusTarget, KeyboardSurface};
use partybox_core::library::load_library;
use partybox_core::playback::{format_time, PlaybackCoordinator, PlaybackEvent};
use partybox_core::CategoryKey;

use crate::{spawn_stdin_reader, MixArgs, FRAME_INTERVAL};

const HELP: &str = "\
Commands (categories and tracks are numbered from 1):
  play N | pause N | stop N | select N I
  vol N V | global V | mode on|off
  loop N on|off | fadein N on|off | fadeout N on|off
  space | up | down | left | right | m | l
  status | help | quit";

#[derive(Debug, Clone, PartialEq)]
enum MixCommand {
    Play(CategoryKey),
    Pause(CategoryKey),
    Stop(CategoryKey),
    Select(CategoryKey, usize),
    Volume(CategoryKey, f32),
    Global(f32),
    Mode(bool),
    Loop(CategoryKey, bool),
    FadeIn(CategoryKey, bool),
    FadeOut(CategoryKey, bool),
    /// A shortcut key name routed through the keyboard surface
    Key(String),
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<MixCommand, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let category = |i: usize| -> Result<CategoryKey, String> {
        let raw = words.get(i).ok_or("missing category number")?;
        match raw.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(CategoryKey(n - 1)),
            _ => Err(format!("invalid category '{}'", raw)),
        }
    };
    let switch = |i: usize| -> Result<bool, String> {
        match words.get(i).copied() {
            Some("on") => Ok(true),
            Some("off") => Ok(false),
            _ => Err("expected on or off".to_string()),
        }
    };
    let volume = |i: usize| -> Result<f32, String> {
        let raw = words.get(i).ok_or("missing volume")?;
        raw.parse::<f32>()
            .map_err(|_| format!("invalid volume '{}'", raw))
    };

    let Some(first) = words.first() else {
        return Err("empty command".to_string());
    };
    let command = match first.to_lowercase().as_str() {
        "play" => MixCommand::Play(category(1)?),
        "pause" => MixCommand::Pause(category(1)?),
        "stop" => MixCommand::Stop(category(1)?),
        "select" => {
            let raw = words.get(2).ok_or("missing track number")?;
            let track = match raw.parse::<usize>() {
                Ok(n) if n >= 1 => n - 1,
                _ => return Err(format!("invalid track '{}'", raw)),
            };
            MixCommand::Select(category(1)?, track)
        }
        "vol" => MixCommand::Volume(category(1)?, volume(2)?),
        "global" => MixCommand::Global(volume(1)?),
        "mode" => MixCommand::Mode(switch(1)?),
        "loop" => MixCommand::Loop(category(1)?, switch(2)?),
        "fadein" => MixCommand::FadeIn(category(1)?, switch(2)?),
        "fadeout" => MixCommand::FadeOut(category(1)?, switch(2)?),
        "space" | "up" | "down" | "left" | "right" | "m" | "l" => {
            MixCommand::Key(first.to_string())
        }
        "status" => MixCommand::Status,
        "help" | "?" => MixCommand::Help,
        "q" | "quit" => MixCommand::Quit,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(command)
}

pub async fn run(args: MixArgs, config: &PartyConfig) -> Result<()> {
    let categories = load_library(&args.library)
        .with_context(|| format!("Cannot load library {:?}", args.library))?;

    for (i, category) in categories.iter().enumerate() {
        println!("{}. {}", i + 1, category.title);
        for (j, track) in category.tracks.iter().enumerate() {
            println!("     {}. {}", j + 1, track.title);
        }
    }
    println!("{}", HELP);

    let mut mixer = PlaybackCoordinator::new(categories, SimulatedBackend::new(), &config.mixer);
    let events = mixer.subscribe();
    let keyboard = KeyboardSurface::new(config.keybindings.clone());

    let mut input = spawn_stdin_reader();
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    let mut last_frame = Instant::now();
    let mut shown_track: Option<String> = None;

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let now = Instant::now();
                mixer.backend_mut().advance(now.saturating_duration_since(last_frame));
                last_frame = now;
                mixer.tick(now);
            }
            line = input.recv() => {
                let Some(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(MixCommand::Quit) => break,
                    Ok(command) => apply(&mut mixer, &keyboard, command),
                    Err(message) => println!("? {}", message),
                }
            }
        }

        for event in events.try_iter() {
            print_event(&mixer, &event, &mut shown_track);
        }
    }

    log::info!("run: Mixer closed");
    Ok(())
}

fn apply(
    mixer: &mut PlaybackCoordinator<SimulatedBackend>,
    keyboard: &KeyboardSurface,
    command: MixCommand,
) {
    let now = Instant::now();
    let result = match command {
        MixCommand::Play(key) => mixer.play(key, now),
        MixCommand::Pause(key) => mixer.pause(key, now),
        MixCommand::Stop(key) => mixer.stop(key),
        MixCommand::Select(key, track) => mixer.select_track(key, track, now),
        MixCommand::Volume(key, volume) => mixer.set_category_volume(key, volume).map(|applied| {
            if !applied {
                println!("Global volume mode is on, per-category volume is disabled");
            }
        }),
        MixCommand::Global(volume) => {
            mixer.set_global_volume(volume);
            Ok(())
        }
        MixCommand::Mode(global) => {
            mixer.set_global_volume_mode(global);
            Ok(())
        }
        MixCommand::Loop(key, on) => mixer.set_loop_enabled(key, on),
        MixCommand::FadeIn(key, on) => mixer.set_fade_in_enabled(key, on),
        MixCommand::FadeOut(key, on) => mixer.set_fade_out_enabled(key, on),
        MixCommand::Key(name) => {
            if keyboard.handle(mixer, &name, FocusTarget::Page, now).is_none() {
                if keyboard.bindings.resolve(&name).is_none() {
                    println!("'{}' is not bound", name);
                } else {
                    println!("'{}': no active category", name);
                }
            }
            Ok(())
        }
        MixCommand::Status => {
            print_status(mixer);
            Ok(())
        }
        MixCommand::Help => {
            println!("{}", HELP);
            Ok(())
        }
        MixCommand::Quit => Ok(()),
    };
    if let Err(e) = result {
        println!("! {}", e);
    }
}

fn print_status(mixer: &PlaybackCoordinator<SimulatedBackend>) {
    println!(
        "global {:.0}% ({})",
        mixer.global_volume() * 100.0,
        if mixer.global_volume_mode() { "global mode" } else { "per-category" }
    );
    for snap in mixer.snapshots() {
        println!(
            "{}. {:<16} {:<7} {} / {} vol {:.0}%{}{}",
            snap.key.index() + 1,
            snap.title,
            if snap.playing { "playing" } else { "paused" },
            format_time(snap.current_time),
            format_time(snap.duration.unwrap_or(0.0)),
            mixer.displayed_category_volume(snap.key).unwrap_or(0.0) * 100.0,
            if snap.loop_enabled { " loop" } else { "" },
            snap.track_title.map(|t| format!(" [{}]", t)).unwrap_or_default(),
        );
    }
}

fn print_event(
    mixer: &PlaybackCoordinator<SimulatedBackend>,
    event: &PlaybackEvent,
    shown_track: &mut Option<String>,
) {
    let title = |key: CategoryKey| {
        mixer
            .snapshot(key)
            .map_or_else(|| key.to_string(), |s| s.title)
    };
    match event {
        PlaybackEvent::TrackSelected { category, title: track, .. } => {
            println!("{}: selected {}", title(*category), track)
        }
        PlaybackEvent::Started { category } => println!("{}: playing", title(*category)),
        PlaybackEvent::FadeStarted { category, kind } => {
            log::debug!("print_event: {} {:?}", title(*category), kind)
        }
        PlaybackEvent::Paused { category } => println!("{}: paused", title(*category)),
        PlaybackEvent::Stopped { category } => println!("{}: stopped", title(*category)),
        PlaybackEvent::Transport(Some(display)) => {
            if shown_track.as_deref() != Some(display.track_title.as_str()) {
                println!(
                    "now playing: {} - {} {}",
                    display.category_title,
                    display.track_title,
                    display.time_label()
                );
                *shown_track = Some(display.track_title.clone());
            }
        }
        PlaybackEvent::Transport(None) => *shown_track = None,
        PlaybackEvent::LoopJump { category, from, to } => println!(
            "{}: loop {} -> {}",
            title(*category),
            format_time(*from),
            format_time(*to)
        ),
        PlaybackEvent::VolumeModeChanged { global } => {
            println!("global volume mode {}", if *global { "on" } else { "off" })
        }
        PlaybackEvent::LoopToggled { category, enabled } => println!(
            "{}: loop {}",
            title(*category),
            if *enabled { "on" } else { "off" }
        ),
        PlaybackEvent::Feedback(text) => println!("[{}]", text),
        PlaybackEvent::Error { category, message } => {
            println!("{}: error: {}", title(*category), message)
        }
        PlaybackEvent::TimeUpdate { .. }
        | PlaybackEvent::VolumeChanged { .. }
        | PlaybackEvent::FeedbackCleared => {}
    }
}
