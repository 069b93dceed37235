use anyhow::Result;
use clap::Parser;
use tracing::info;

use tether_devices::{DeviceId, Fan, Light, PowerStateController, RangeController};
use tether_engine::{Engine, DEFAULT_SERVER};
use tether_transport::{MockTransport, TransportKind};

#[derive(Parser)]
#[command(name = "tether-demo")]
#[command(about = "Tether broker client demo over the mock transports")]
struct Args {
    /// Socket authentication key (UUID-shaped)
    #[arg(long, default_value = "de0b8a11-1a3b-4c3d-aa2e-5dab00000000")]
    app_key: String,

    /// Message signing secret (two UUIDs joined by a dash)
    #[arg(
        long,
        default_value = "5f360000-a3b7-4c3d-aebe-e86724a90000-4c4a0000-3b3c-45de-a9a3-333d65000000"
    )]
    app_secret: String,

    /// Broker address
    #[arg(long, default_value = DEFAULT_SERVER)]
    server: String,

    /// Number of scheduling ticks to run
    #[arg(long, default_value = "10")]
    ticks: u32,
}

const LIGHT_ID: &str = "5dc1564130b2a3f9c8d7e6f0";
const FAN_ID: &str = "aabbccddeeff001122334455";

fn main() -> Result<()> {
    setup_tracing();
    let args = Args::parse();

    let websocket = MockTransport::new(TransportKind::Websocket);
    let probe = websocket.probe();
    let udp = MockTransport::new(TransportKind::Udp);
    let mut engine = Engine::new(vec![Box::new(websocket), Box::new(udp)]);

    engine.configure(&args.app_key, &args.app_secret, &args.server)?;
    engine.on_connected(|| info!("broker link established"));
    engine.on_disconnected(|| info!("broker link lost"));

    let light = engine.device::<Light>(DeviceId::new(LIGHT_ID));
    if let Some(power) = light.capability_mut::<PowerStateController>() {
        power.on_power_state(|id, on| {
            info!(device_id = %id, on = *on, "light power request");
            true
        });
    }
    if let Some(brightness) = light.capability_mut::<RangeController>() {
        brightness.on_value(|id, value| {
            *value = (*value).clamp(0, 100);
            info!(device_id = %id, brightness = *value, "light brightness request");
            true
        });
    }

    let fan = engine.device::<Fan>(DeviceId::new(FAN_ID));
    if let Some(range) = fan.capability_mut::<RangeController>() {
        range.on_value(|id, value| {
            info!(device_id = %id, speed = *value, "fan speed request");
            true
        });
        range.on_value_float("humidity", |id, instance, value| {
            info!(device_id = %id, instance, target = *value, "humidity target request");
            true
        });
    }

    // The mock broker greets us with a timestamp probe so the clock can
    // synchronize and outbound traffic can flow.
    probe.inject("{\"timestamp\":1700000000}");

    for tick in 0..args.ticks {
        engine.tick();
        if tick == 2 {
            let draft = {
                let fan = engine.device::<Fan>(DeviceId::new(FAN_ID));
                fan.capability_mut::<RangeController>()
                    .map(|range| range.value_event(3))
            };
            if let Some(draft) = draft {
                let queued = engine.send_event(&DeviceId::new(FAN_ID), draft);
                info!(queued, "fan speed event");
            }
        }
    }

    for text in probe.sent() {
        info!(message = %text, "transmitted");
    }

    engine.stop();
    Ok(())
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
