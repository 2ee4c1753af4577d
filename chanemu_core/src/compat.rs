//! Compatibility stubs for the rest of the hardware-abstraction surface.
//!
//! Control software written against real hardware calls far more than the
//! emulator models: antennas, calibration, registers, sensors, GPIO and so
//! on. Every such call is accepted here and answered with a neutral value
//! (`()`, `0`, `false`, `None`, empty string or list) so that code resolves
//! and runs.
//!
//! **Nothing here has an effect.** Setters store nothing and getters never
//! reflect earlier setters. Tests must not depend on any of it; behaviour
//! that matters lives on [`RadioHal`](crate::radio::RadioHal).

use crate::radio::VirtualRadio;
use chanemu_env::{Direction, Sample, StreamResult};

/// Inclusive numeric range as reported by range queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub minimum: f64,
    pub maximum: f64,
    pub step: f64,
}

/// No-op remainder of the hardware-abstraction surface.
#[allow(unused_variables)]
pub trait HalCompat {
    // Lifecycle
    
    /// Accepted and ignored; radios are built with `VirtualRadio::open`.
    fn make(&mut self, args: &str) {}
    
    fn unmake(&mut self) {}
    
    fn close(&mut self) {}
    
    // Identification
    
    fn driver_key(&self) -> String {
        String::new()
    }
    
    fn hardware_key(&self) -> String {
        String::new()
    }
    
    fn channel_info(&self, direction: Direction, channel: usize) -> Vec<(String, String)> {
        Vec::new()
    }
    
    fn full_duplex(&self, direction: Direction, channel: usize) -> bool {
        false
    }
    
    fn frontend_mapping(&self, direction: Direction) -> String {
        String::new()
    }
    
    fn set_frontend_mapping(&mut self, direction: Direction, mapping: &str) {}
    
    // Antenna
    
    fn list_antennas(&self, direction: Direction, channel: usize) -> Vec<String> {
        Vec::new()
    }
    
    fn antenna(&self, direction: Direction, channel: usize) -> Option<String> {
        None
    }
    
    fn set_antenna(&mut self, direction: Direction, channel: usize, name: &str) {}
    
    // Front-end corrections
    
    fn has_dc_offset_mode(&self, direction: Direction, channel: usize) -> bool {
        false
    }
    
    fn dc_offset_mode(&self, direction: Direction, channel: usize) -> bool {
        false
    }
    
    fn set_dc_offset_mode(&mut self, direction: Direction, channel: usize, automatic: bool) {}
    
    fn has_dc_offset(&self, direction: Direction, channel: usize) -> bool {
        false
    }
    
    fn dc_offset(&self, direction: Direction, channel: usize) -> Option<Sample> {
        None
    }
    
    fn set_dc_offset(&mut self, direction: Direction, channel: usize, offset: Sample) {}
    
    fn has_iq_balance(&self, direction: Direction, channel: usize) -> bool {
        false
    }
    
    fn iq_balance(&self, direction: Direction, channel: usize) -> Option<Sample> {
        None
    }
    
    fn set_iq_balance(&mut self, direction: Direction, channel: usize, balance: Sample) {}
    
    fn has_frequency_correction(&self, direction: Direction, channel: usize) -> bool {
        false
    }
    
    fn frequency_correction(&self, direction: Direction, channel: usize) -> f64 {
        0.0
    }
    
    fn set_frequency_correction(&mut self, direction: Direction, channel: usize, ppm: f64) {}
    
    fn has_gain_mode(&self, direction: Direction, channel: usize) -> bool {
        false
    }
    
    fn gain_mode(&self, direction: Direction, channel: usize) -> bool {
        false
    }
    
    fn set_gain_mode(&mut self, direction: Direction, channel: usize, automatic: bool) {}
    
    // Ranges and lists
    
    fn list_gains(&self, direction: Direction, channel: usize) -> Vec<String> {
        Vec::new()
    }
    
    fn list_frequencies(&self, direction: Direction, channel: usize) -> Vec<String> {
        Vec::new()
    }
    
    fn frequency_range(&self, direction: Direction, channel: usize) -> Vec<Range> {
        Vec::new()
    }
    
    fn frequency_args_info(&self, direction: Direction, channel: usize) -> Vec<String> {
        Vec::new()
    }
    
    fn list_sample_rates(&self, direction: Direction, channel: usize) -> Vec<f64> {
        Vec::new()
    }
    
    fn sample_rate_range(&self, direction: Direction, channel: usize) -> Vec<Range> {
        Vec::new()
    }
    
    fn list_bandwidths(&self, direction: Direction, channel: usize) -> Vec<f64> {
        Vec::new()
    }
    
    fn bandwidth_range(&self, direction: Direction, channel: usize) -> Vec<Range> {
        Vec::new()
    }
    
    // Clocking and time
    
    fn master_clock_rate(&self) -> f64 {
        0.0
    }
    
    fn set_master_clock_rate(&mut self, rate: f64) {}
    
    fn master_clock_rates(&self) -> Vec<Range> {
        Vec::new()
    }
    
    fn list_clock_sources(&self) -> Vec<String> {
        Vec::new()
    }
    
    fn clock_source(&self) -> String {
        String::new()
    }
    
    fn set_clock_source(&mut self, source: &str) {}
    
    fn list_time_sources(&self) -> Vec<String> {
        Vec::new()
    }
    
    fn time_source(&self) -> String {
        String::new()
    }
    
    fn set_time_source(&mut self, source: &str) {}
    
    fn has_hardware_time(&self, what: &str) -> bool {
        false
    }
    
    fn hardware_time(&self, what: &str) -> i64 {
        0
    }
    
    fn set_hardware_time(&mut self, time_ns: i64, what: &str) {}
    
    fn set_command_time(&mut self, time_ns: i64, what: &str) {}
    
    // Sensors and settings
    
    fn list_sensors(&self) -> Vec<String> {
        Vec::new()
    }
    
    fn read_sensor(&self, key: &str) -> Option<String> {
        None
    }
    
    fn read_channel_sensor(&self, direction: Direction, channel: usize, key: &str) -> Option<String> {
        None
    }
    
    fn sensor_info(&self, key: &str) -> Option<String> {
        None
    }
    
    fn read_sensor_bool(&self, key: &str) -> Option<bool> {
        None
    }
    
    fn read_sensor_float(&self, key: &str) -> Option<f64> {
        None
    }
    
    fn read_sensor_int(&self, key: &str) -> Option<i64> {
        None
    }
    
    fn setting_info(&self) -> Vec<String> {
        Vec::new()
    }
    
    fn read_setting(&self, key: &str) -> Option<String> {
        None
    }
    
    fn read_setting_bool(&self, key: &str) -> Option<bool> {
        None
    }
    
    fn read_setting_float(&self, key: &str) -> Option<f64> {
        None
    }
    
    fn read_setting_int(&self, key: &str) -> Option<i64> {
        None
    }
    
    fn write_setting(&mut self, key: &str, value: &str) {}
    
    // Registers
    
    fn list_register_interfaces(&self) -> Vec<String> {
        Vec::new()
    }
    
    fn read_register(&self, interface: &str, addr: u32) -> u32 {
        0
    }
    
    fn write_register(&mut self, interface: &str, addr: u32, value: u32) {}
    
    fn read_registers(&self, interface: &str, addr: u32, length: usize) -> Vec<u32> {
        Vec::new()
    }
    
    fn write_registers(&mut self, interface: &str, addr: u32, values: &[u32]) {}
    
    // GPIO, I2C, SPI, UART
    
    fn list_gpio_banks(&self) -> Vec<String> {
        Vec::new()
    }
    
    fn read_gpio(&self, bank: &str) -> u32 {
        0
    }
    
    fn write_gpio(&mut self, bank: &str, value: u32, mask: u32) {}
    
    fn read_gpio_dir(&self, bank: &str) -> u32 {
        0
    }
    
    fn write_gpio_dir(&mut self, bank: &str, dir: u32, mask: u32) {}
    
    fn read_i2c(&self, addr: i32, num_bytes: usize) -> Vec<u8> {
        Vec::new()
    }
    
    fn write_i2c(&mut self, addr: i32, data: &[u8]) {}
    
    fn transact_spi(&mut self, addr: i32, data: u32, num_bits: usize) -> u32 {
        0
    }
    
    fn list_uarts(&self) -> Vec<String> {
        Vec::new()
    }
    
    fn read_uart(&self, which: &str, timeout_us: i64) -> String {
        String::new()
    }
    
    fn write_uart(&mut self, which: &str, data: &str) {}
    
    // Stream extras
    
    fn stream_formats(&self, direction: Direction, channel: usize) -> Vec<String> {
        Vec::new()
    }
    
    fn native_stream_format(&self, direction: Direction, channel: usize) -> Option<(String, f64)> {
        None
    }
    
    fn stream_args_info(&self, direction: Direction, channel: usize) -> Vec<String> {
        Vec::new()
    }
    
    fn stream_mtu(&self) -> usize {
        0
    }
    
    fn read_stream_status(&self, timeout_us: i64) -> Option<StreamResult> {
        None
    }
    
    // Direct buffer access
    
    fn num_direct_access_buffers(&self) -> usize {
        0
    }
    
    fn direct_access_buffer_addrs(&self, handle: usize) -> Vec<usize> {
        Vec::new()
    }
    
    fn acquire_read_buffer(&mut self, timeout_us: i64) -> Option<usize> {
        None
    }
    
    fn release_read_buffer(&mut self, handle: usize) {}
    
    fn acquire_write_buffer(&mut self, timeout_us: i64) -> Option<usize> {
        None
    }
    
    fn release_write_buffer(&mut self, handle: usize, num_elems: usize) {}
}

impl HalCompat for VirtualRadio {}
