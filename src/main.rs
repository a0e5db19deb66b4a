//! DeskSniffer - firmware entry point
//!
//! 1. Attach the display bus ISRs
//! 2. Claim the desk controller and button GPIOs
//! 3. Join Wi-Fi and start the `/desk` HTTP server
//! 4. Run the poll loop every `poll_interval_ms`

#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::{AnyInputPin, AnyOutputPin, PinDriver, Pull};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::{self, EspError};

    use desk_sniffer::hal::{connect_wifi, serve, BusSniffer};
    use desk_sniffer::log_drain::{drain_to, Stdout};
    use desk_sniffer::{
        diag_error, diag_info, CaptureBuffer, Desk, DeskConfig, DeskMailbox, LogStream,
        ManualControls, ManualInput, MotionController, PinConfig, WifiConfig,
    };

    // Shared with the GPIO ISRs
    static CAPTURE: CaptureBuffer = CaptureBuffer::new();
    static DIAG_LOG: LogStream = LogStream::new();
    // Shared with the HTTP server task
    static MAILBOX: DeskMailbox = DeskMailbox::new();

    /// Let the desk controller finish its own power-up first.
    const BOOT_DELAY_MS: u32 = 3000;

    pub fn run() -> Result<(), EspError> {
        sys::link_patches();

        let config = DeskConfig::default();
        let pins = PinConfig::default();

        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        FreeRtos::delay_ms(BOOT_DELAY_MS);
        diag_info!(DIAG_LOG, 0, "{}", env!("VERSION_STRING"));

        let _sniffer = BusSniffer::attach(&CAPTURE, pins.sda, pins.scl)?;

        // SAFETY: pin numbers come from PinConfig and are claimed once
        let (up, down) = unsafe {
            (
                PinDriver::output(AnyOutputPin::new(pins.desk_up))?,
                PinDriver::output(AnyOutputPin::new(pins.desk_down))?,
            )
        };
        let motion = MotionController::new(up, down, config)?;

        let mut button_up = PinDriver::input(unsafe { AnyInputPin::new(pins.button_up) })?;
        let mut button_down = PinDriver::input(unsafe { AnyInputPin::new(pins.button_down) })?;
        let mut button_middle = PinDriver::input(unsafe { AnyInputPin::new(pins.button_middle) })?;
        button_up.set_pull(Pull::Up)?;
        button_down.set_pull(Pull::Up)?;
        button_middle.set_pull(Pull::Up)?;
        let mut buttons = ManualControls::new(button_up, button_down);

        let wifi = connect_wifi(
            peripherals.modem,
            sysloop,
            nvs,
            &WifiConfig::from_build_env(),
        )?;
        let ip = wifi.wifi().sta_netif().get_ip_info()?.ip;
        diag_info!(DIAG_LOG, 0, "Connected, IP address: {}", ip);

        let _server = serve(&MAILBOX)?;
        diag_info!(DIAG_LOG, 0, "HTTP server started");

        let mut desk = Desk::new(motion, config, &DIAG_LOG);

        loop {
            FreeRtos::delay_ms(config.poll_interval_ms);

            let manual = buttons.read().unwrap_or_else(|e| {
                diag_error!(DIAG_LOG, desk.ticks(), "Buttons: {:?}", e);
                ManualInput::None
            });

            match desk.tick(&CAPTURE, manual, MAILBOX.take_request()) {
                Ok(outcome) => MAILBOX.publish_height(outcome.height),
                Err(e) => {
                    diag_error!(DIAG_LOG, desk.ticks(), "Desk pins: {:?}", e);
                    let _ = desk.halt();
                }
            }

            drain_to(&DIAG_LOG, &mut Stdout);

            if !wifi.is_connected().unwrap_or(false) {
                diag_error!(DIAG_LOG, desk.ticks(), "Wi-Fi lost, restarting");
                drain_to(&DIAG_LOG, &mut Stdout);
                let _ = desk.halt();
                unsafe { sys::esp_restart() };
            }
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() {
    if let Err(e) = firmware::run() {
        println!("[ERROR] Startup failed: {:?}", e);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!("{} (host build, no hardware)", env!("VERSION_STRING"));
}
