// --- Strip Config ---
pub const NUM_LEDS: usize = 39;
pub const SPI_RATE_KHZ: u32 = 3_200; // 4 SPI bits per WS2812 bit

// --- Pins (must match the GPIO claimed in main) ---
pub const MIC_PIN: u8 = 1; // ADC1 channel 0
pub const KNOB_PIN: u8 = 2; // ADC1 channel 1
pub const LED_PIN: u8 = 38;
pub const BUTTON_PIN: u8 = 15;
pub const BOOT_PIN: u8 = 0; // Stops the meter and blanks the strip

// --- ADC ---
pub const ADC_BITS: u32 = 12;
pub const ADC_MAX: u16 = (1 << ADC_BITS) - 1;

// --- System Config ---
pub const HEAP_SIZE: usize = 8 * 1024;
