#![no_std]
#![no_main]

extern crate alloc;

use core::cell::RefCell;
use core::mem::MaybeUninit;
use core::sync::atomic::Ordering;

#[cfg(feature = "logging")]
use defmt::{error, info};
#[cfg(feature = "logging")]
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use esp_backtrace as _;
use esp_hal::{
    analog::adc::{Adc, AdcConfig, Attenuation},
    clock::CpuClock,
    gpio::{Input, InputConfig, Pull},
    spi::{
        master::{Config as SpiConfig, Spi},
        Mode,
    },
    time::Rate,
    timer::timg::TimerGroup,
};
use vu_meter::{Peripherals, VuConfig, VuMeter, Wiring};
use vu_meter_esp32::{
    adc::{AdcMic, SharedAdc},
    config::*,
    ws2812::{Ws2812Spi, BUFFER_SIZE},
    EmbassyClock, SHUTDOWN,
};
#[cfg(feature = "preset-threshold-knob")]
use vu_meter_esp32::adc::AdcKnob;

/// Global brightness for the strip, out of 255.
const BRIGHTNESS: u8 = 64;

cfg_if::cfg_if! {
    if #[cfg(feature = "preset-threshold-knob")] {
        fn preset() -> VuConfig { VuConfig::threshold_knob() }
    } else if #[cfg(feature = "preset-zone-flashes")] {
        fn preset() -> VuConfig { VuConfig::zone_flashes() }
    } else if #[cfg(feature = "preset-no-decay")] {
        fn preset() -> VuConfig { VuConfig::no_decay() }
    } else if #[cfg(feature = "preset-fast-attack-slow-decay")] {
        fn preset() -> VuConfig { VuConfig::fast_attack_slow_decay() }
    } else if #[cfg(feature = "preset-slow-attack-fast-decay")] {
        fn preset() -> VuConfig { VuConfig::slow_attack_fast_decay() }
    } else {
        fn preset() -> VuConfig { VuConfig::peak_hold() }
    }
}

/// Initialize the heap for the meter's frame buffer
fn init_heap() {
    static mut HEAP: MaybeUninit<[u8; HEAP_SIZE]> = MaybeUninit::uninit();

    unsafe {
        esp_alloc::HEAP.add_region(esp_alloc::HeapRegion::new(
            core::ptr::addr_of_mut!(HEAP) as *mut u8,
            HEAP_SIZE,
            esp_alloc::MemoryCapability::Internal.into(),
        ));
    }
}

/// Macro to create static variables
macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

#[embassy_executor::task]
async fn shutdown_button(mut boot: Input<'static>) {
    boot.wait_for_falling_edge().await;
    #[cfg(feature = "logging")]
    info!("BOOT pressed, stopping meter");
    SHUTDOWN.store(true, Ordering::Relaxed);
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_heap();

    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timg0.timer0);

    let base = preset();
    let config = VuConfig {
        num_leds: NUM_LEDS,
        wiring: Wiring {
            mic_pin: MIC_PIN,
            led_pin: LED_PIN,
            button_pin: base.wiring.button_pin.map(|_| BUTTON_PIN),
            knob_pin: base.wiring.knob_pin.map(|_| KNOB_PIN),
        },
        ..base
    };

    #[cfg(feature = "logging")]
    {
        info!(
            "VU meter starting: {} LEDs, mic on GPIO{}, strip on GPIO{}",
            config.num_leds, config.wiring.mic_pin, config.wiring.led_pin
        );
        info!("Response {}, scale {}", config.response, config.scale);
        info!("Press BOOT (GPIO{}) to stop", BOOT_PIN);
    }

    let mut adc_config = AdcConfig::new();
    let mic_pin = adc_config.enable_pin(peripherals.GPIO1, Attenuation::_11dB);
    #[cfg(feature = "preset-threshold-knob")]
    let knob_pin = adc_config.enable_pin(peripherals.GPIO2, Attenuation::_11dB);
    let adc = mk_static!(SharedAdc, RefCell::new(Adc::new(peripherals.ADC1, adc_config)));

    let spi = Spi::new(
        peripherals.SPI2,
        SpiConfig::default()
            .with_frequency(Rate::from_khz(SPI_RATE_KHZ))
            .with_mode(Mode::_0),
    )
    .expect("Failed to configure SPI for the LED strip")
    .with_mosi(peripherals.GPIO38);
    let buffer = mk_static!([u8; BUFFER_SIZE], [0u8; BUFFER_SIZE]);
    let strip = Ws2812Spi::new(spi, buffer, BRIGHTNESS);

    let boot = Input::new(peripherals.GPIO0, InputConfig::default().with_pull(Pull::Up));
    spawner
        .spawn(shutdown_button(boot))
        .expect("Failed to spawn shutdown_button");

    let hardware = Peripherals::new(AdcMic::new(adc, mic_pin), strip);
    #[cfg(feature = "preset-threshold-knob")]
    let hardware = hardware
        .with_button(Input::new(
            peripherals.GPIO15,
            InputConfig::default().with_pull(Pull::Up),
        ))
        .with_knob(AdcKnob::new(adc, knob_pin));

    let outcome = match VuMeter::new(config, hardware, EmbassyClock, Delay) {
        Ok(mut meter) => meter.run(&SHUTDOWN).await,
        Err(e) => Err(e),
    };

    #[cfg(feature = "logging")]
    match outcome {
        Ok(()) => info!("Meter stopped, strip blanked"),
        Err(e) => error!("Meter stopped on {}", e),
    }
    #[cfg(not(feature = "logging"))]
    let _ = outcome;

    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}
