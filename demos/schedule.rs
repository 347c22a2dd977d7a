//! Scheduling walkthrough: a fade, a cancel-and-hold, and a replay onto a second sink

use std::sync::Arc;

use automation_timeline::prelude::*;
use parking_lot::Mutex;

fn main() -> Result<(), ParamError> {
    println!("Automation Timeline - Scheduling Walkthrough\n");

    fade()?;
    hold()?;
    replay()?;
    Ok(())
}

fn fade() -> Result<(), ParamError> {
    println!("1. Linear fade-in\n");

    let sink = Arc::new(Mutex::new(RecordingSink::new(0.0)));
    let mut gain = AutomationParam::builder().sink(sink.clone()).build()?;
    gain.set_value_at_time(0.0, 0.0)?
        .linear_ramp_to_value_at_time(1.0, 4.0)?;

    for time in [0.0, 1.0, 2.0, 4.0, 6.0] {
        println!("   t={time}: {:.2}", gain.get_value_at_time(time));
    }
    println!("   sink received {} commands\n", sink.lock().commands().len());
    Ok(())
}

fn hold() -> Result<(), ParamError> {
    println!("2. Filter sweep, held halfway\n");

    let sink = Arc::new(Mutex::new(RecordingSink::new(100.0)));
    let mut cutoff = AutomationParam::builder()
        .sink(sink.clone())
        .units(Unit::Frequency)
        .build()?;
    cutoff
        .set_value_at_time(100.0, 0.0)?
        .exponential_ramp_to_value_at_time(10_000.0, 4.0)?;

    println!("   before hold, t=3: {:.1} Hz", cutoff.get_value_at_time(3.0));
    cutoff.cancel_and_hold_at_time(2.0)?;
    println!("   after hold,  t=2: {:.1} Hz", cutoff.get_value_at_time(2.0));
    println!("   after hold,  t=3: {:.1} Hz", cutoff.get_value_at_time(3.0));

    for command in sink.lock().commands() {
        println!("   -> {command}");
    }
    println!();
    Ok(())
}

fn replay() -> Result<(), ParamError> {
    println!("3. Replay onto a fresh sink\n");

    let clock = Arc::new(ManualClock::new(0.0));
    let sink = Arc::new(Mutex::new(RecordingSink::new(0.0)));
    let mut level = AutomationParam::builder()
        .sink(sink)
        .clock(clock.clone())
        .build()?;
    level
        .set_value_at_time(0.0, 0.0)?
        .set_target_at_time(1.0, 0.5, 0.2)?
        .linear_ramp_to_value_at_time(0.25, 3.0)?;

    clock.set(1.0);
    let mut fresh = RecordingSink::new(0.0);
    level.apply(&mut fresh);

    println!("   now={}: {:.3}", level.now(), level.value());
    for command in fresh.commands() {
        println!("   -> {command}");
    }

    let buffer = level.to_buffer(4.0, 0.0, 3.0);
    println!("   sampled at 4 Hz: {buffer:.2?}");

    level.dispose();
    Ok(())
}
