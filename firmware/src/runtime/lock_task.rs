use embassy_stm32::gpio::Input;
use embassy_time::{Duration, Ticker};
use lockbox_core::{ButtonLevel, Lockbox};

use crate::clock::FirmwareInstant;
use crate::hw::{LedIndicator, ServoActuator};
use crate::status::AtomicStatusPublisher;
use crate::telemetry::TelemetryDrain;

/// Button sample period.
const TICK_PERIOD: Duration = Duration::from_millis(5);

pub type FirmwareLockbox =
    Lockbox<FirmwareInstant, ServoActuator<'static>, LedIndicator<'static>, AtomicStatusPublisher>;

#[embassy_executor::task]
pub async fn run(mut lockbox: FirmwareLockbox, button: Input<'static>) -> ! {
    let mut ticker = Ticker::every(TICK_PERIOD);
    let mut drain = TelemetryDrain::new();

    loop {
        let level = if button.is_low() {
            ButtonLevel::Low
        } else {
            ButtonLevel::High
        };

        lockbox.tick_level(FirmwareInstant::now(), level);
        drain.forward(lockbox.telemetry());

        ticker.next().await;
    }
}
