use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::time::hz;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use lockbox_core::Lockbox;
use lockbox_core::code::REFERENCE_SECRET;
use lockbox_core::config::LockboxConfig;

use crate::hw::{LedIndicator, ServoActuator};
use crate::status::AtomicStatusPublisher;

mod lock_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals { PA0, PA5, PA6, TIM3, .. } = hal::init(config);

    let lock_config = LockboxConfig::REFERENCE;

    let button = Input::new(PA0, Pull::Up);
    let led = LedIndicator::new(Output::new(PA5, Level::Low, Speed::Low));

    let servo_pin = PwmPin::new(PA6, OutputType::PushPull);
    let pwm = SimplePwm::new(
        TIM3,
        Some(servo_pin),
        None,
        None,
        None,
        hz(50),
        Default::default(),
    );
    let servo = ServoActuator::new(pwm.split().ch1, lock_config.servo);

    let lockbox = Lockbox::with_components(
        lock_config,
        REFERENCE_SECRET,
        servo,
        led,
        AtomicStatusPublisher,
    )
    .expect("reference lock configuration");

    defmt::info!("lockbox ready, status {}", crate::status::status_str());

    spawner
        .spawn(lock_task::run(lockbox, button))
        .expect("failed to spawn lock task");

    core::future::pending::<()>().await;
}
