//! `partybox draw`: run a lucky draw session in the terminal
//!
//! Press Enter to draw, `r` to reset the session, `q` to quit.

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use partybox_core::config::PartyConfig;
use partybox_core::draw::{DrawEngine, DrawEvent, DrawOutcome, DrawPhase};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{spawn_stdin_reader, DrawArgs, FRAME_INTERVAL};

pub async fn run(args: DrawArgs, config: &PartyConfig) -> Result<()> {
    let raw = std::fs::read_to_string(&args.participants)
        .with_context(|| format!("Failed to read participants from {:?}", args.participants))?;
    let lucky_count = args.count.unwrap_or(config.draw.lucky_count);
    let spin_duration = args.duration.unwrap_or_else(|| config.draw.spin_duration());

    let mut engine = DrawEngine::new(&config.draw, StdRng::from_entropy());
    let events = engine.subscribe();
    engine
        .start_from_text(&raw, lucky_count, spin_duration)
        .context("Cannot start draw session")?;

    println!(
        "{} participants, drawing {} winners. Enter = draw, r = reset, q = quit",
        engine.participants().len(),
        lucky_count
    );

    let mut input = spawn_stdin_reader();
    let mut input_open = true;
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    let mut completed = false;

    loop {
        tokio::select! {
            _ = frames.tick() => {
                engine.tick(Instant::now());
                for event in events.try_iter() {
                    match event {
                        DrawEvent::Crossing { .. } => {
                            print!(".");
                            let _ = std::io::stdout().flush();
                        }
                        DrawEvent::WinnerAnnounced { participant, ordinal } => {
                            let (_, total) = engine.progress();
                            println!("\nWinner {}/{}: {}", ordinal, total, participant);
                        }
                        DrawEvent::SessionComplete { winners } => {
                            println!("Session complete, {} winners:", winners);
                            for (i, winner) in engine.winners().iter().enumerate() {
                                println!("  {:>3}. {}", i + 1, winner);
                            }
                            completed = true;
                        }
                        _ => {}
                    }
                }
                if !input_open && engine.phase() != DrawPhase::Drawing
                    && (engine.phase() != DrawPhase::Complete || completed)
                {
                    break;
                }
            }
            line = input.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    continue;
                };
                match line.trim() {
                    "q" | "quit" => break,
                    "r" | "reset" => {
                        engine.reset_session();
                        completed = false;
                        println!("Session reset");
                    }
                    _ => match engine.draw_next(Instant::now())? {
                        DrawOutcome::Spinning { .. } => {
                            let (drawn, total) = engine.progress();
                            print!("Drawing {}/{} ", drawn, total);
                            let _ = std::io::stdout().flush();
                        }
                        DrawOutcome::Busy => println!("\nStill spinning"),
                        DrawOutcome::SessionComplete => {
                            println!("All winners drawn, r = reset, q = quit")
                        }
                    },
                }
            }
        }
    }

    log::info!("run: Draw finished with {} winners", engine.winners().len());
    Ok(())
}
