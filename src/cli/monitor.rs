use std::error::Error;
use std::time::Duration;

use clap::Args;
use hidapi::HidApi;

use steampad::config::SessionConfig;
use steampad::drivers::steam_controller::{
    component::ButtonId,
    controller::SteamController,
    discover,
    event::{AxisEvent, ButtonEvent, Event},
    gyro_mouse::PointerSink,
    hid_report::Motor,
    transport::HidTransport,
    worker::SharedWorker,
};

#[derive(Args, Debug, Clone)]
pub struct MonitorCommand {
    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 16)]
    pub interval: u64,
    /// Run every session on one shared I/O thread
    #[arg(long, action)]
    pub shared: bool,
}

/// Logs gyro mouse movement instead of moving the system pointer
struct LogPointerSink {
    name: String,
}

impl PointerSink for LogPointerSink {
    fn move_by(&mut self, dx: i32, dy: i32) {
        log::info!("{}: pointer moved by ({dx}, {dy})", self.name);
    }
}

pub async fn handle_monitor(config: SessionConfig, cmd: MonitorCommand) -> Result<(), Box<dyn Error>> {
    let api = HidApi::new()?;
    let entries = discover(&api);
    if entries.is_empty() {
        return Err("No Steam Controller found".into());
    }

    let worker = if cmd.shared {
        Some(SharedWorker::spawn()?)
    } else {
        None
    };

    let mut controllers = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.name();
        let builder = SteamController::builder(entry.product)
            .config(config.clone())
            .name(name.clone())
            .pointer_sink(Box::new(LogPointerSink { name: name.clone() }));
        let controller = match worker.as_ref() {
            Some(worker) => {
                let transport = HidTransport::open(&api, &entry.path)?;
                builder.attach(worker, Box::new(transport))?
            }
            None => builder.open(&api, &entry.path)?,
        };
        log::info!("Monitoring {name} at {}", entry.path);
        controllers.push(controller);
    }
    println!("Press Back on any controller or Ctrl+C to stop");

    let mut interval = tokio::time::interval(Duration::from_millis(cmd.interval.max(1)));
    'monitor: loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break 'monitor,
            _ = interval.tick() => (),
        }

        let mut stopped = Vec::new();
        for (index, controller) in controllers.iter_mut().enumerate() {
            if let Err(e) = controller.poll() {
                log::error!("{e}");
                stopped.push(index);
                continue;
            }
            while let Some(event) = controller.next_event() {
                if print_event(controller, &event) {
                    break 'monitor;
                }
            }
        }
        for index in stopped.into_iter().rev() {
            controllers.remove(index);
        }
        if controllers.is_empty() {
            log::info!("No controller left to monitor");
            break;
        }
    }

    for controller in controllers.iter_mut() {
        controller.close();
    }

    Ok(())
}

/// Print the event and run its smoke test action. Returns true if the
/// monitor should stop.
fn print_event(controller: &SteamController, event: &Event) -> bool {
    match event {
        Event::Button(ButtonEvent {
            button, pressed, ..
        }) => {
            let state = if *pressed { "pressed" } else { "released" };
            println!("{}: {} {state}", controller.name(), button.title());
            if !pressed {
                return false;
            }
            match button {
                ButtonId::A => rumble(controller, Motor::Left),
                ButtonId::B => rumble(controller, Motor::Right),
                ButtonId::Back => return true,
                _ => (),
            }
        }
        Event::Axis(AxisEvent { axis, value, .. }) => {
            println!("{}: {} {value:.3}", controller.name(), axis.title());
        }
    }

    false
}

fn rumble(controller: &SteamController, motor: Motor) {
    let Some(rumbler) = controller.rumblers().iter().find(|r| r.motor() == motor) else {
        return;
    };
    log::info!("{}: rumbling {}", controller.name(), rumbler.name());
    rumbler.rumble(1.0);
}
