//! Headless autoplay: load a chart, drive a session at a fixed tick rate
//! with perfectly timed presses, and print the result. Useful for sanity
//! checking charts and timing without any frontend attached.

use std::path::PathBuf;

use beatline::audio::NullAudio;
use beatline::config;
use beatline::game::gameplay::{PlaySession, SessionState};
use beatline::game::parsing::chartfile;

const TICK_SECONDS: f64 = 1.0 / 240.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .try_init();

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: beatline <chart.mc|chart.mcz>");
        std::process::exit(2);
    };

    let config = config::load();
    let chart = chartfile::load_chart(&path)?;

    // Capture the schedule before the session takes the chart: press at each
    // note's time, release holds once their end has passed.
    let mut schedule: Vec<(f64, usize, Option<f64>)> = chart
        .notes
        .iter()
        .map(|n| (n.time, n.lane, n.end_time))
        .collect();
    schedule.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut session = PlaySession::new(chart, &config, Box::new(NullAudio))?;
    session.start();

    let mut next_press = 0;
    let mut pending_releases: Vec<(f64, usize)> = Vec::new();
    while session.state() != SessionState::Finished {
        session.update(TICK_SECONDS);
        let now = session.game_time();

        while next_press < schedule.len() && schedule[next_press].0 <= now {
            let (_, lane, end_time) = schedule[next_press];
            session.press(lane);
            match end_time {
                Some(end) => pending_releases.push((end, lane)),
                None => session.release(lane),
            }
            next_press += 1;
        }
        pending_releases.retain(|&(end, lane)| {
            if now > end {
                session.release(lane);
                false
            } else {
                true
            }
        });

        // Keep the terminal quiet; the summary below is the interesting part.
        session.drain_events();
    }

    let score = session.score();
    println!("score      {}", score.score);
    println!("max combo  {}", score.max_combo);
    println!("accuracy   {:.2}%", score.accuracy());
    println!(
        "judgments  best {} / cool {} / good {} / miss {}",
        score.best, score.cool, score.good, score.miss
    );
    Ok(())
}
