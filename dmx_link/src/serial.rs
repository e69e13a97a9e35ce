//! DMX transmission over an FTDI USB-serial adapter.

use std::{io::Write, thread, time::Duration};

use log::{debug, info};
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

use dmx_universe::FRAME_LEN;

use crate::{
    error::{LinkError, Result},
    link::DmxLink,
};

/// DMX512-A line rate.
const DMX_BAUD: u32 = 250_000;

/// BREAK hold time; the standard requires at least 88 us.
const BREAK_DURATION: Duration = Duration::from_micros(110);

/// Mark-after-break; the standard requires at least 8 us.
const MAB_DURATION: Duration = Duration::from_micros(16);

/// A DMX link over a USB serial adapter, located by USB identity.
///
/// The port runs at 250 kbaud, 8 data bits, 2 stop bits, no parity,
/// no flow control, RTS low. Each frame is preceded by a BREAK/MAB
/// generated through the port's break control.
pub struct SerialDmxLink {
    port: Box<dyn SerialPort>,
}

impl SerialDmxLink {
    /// Opens the first attached adapter matching `vid`/`pid` and,
    /// when given, the product description and serial number.
    pub fn open(
        vid: u16,
        pid: u16,
        description: Option<&str>,
        serial: Option<&str>,
    ) -> Result<Self> {
        let port_name = find_adapter(vid, pid, description, serial)?;
        info!("opening DMX adapter {vid:04x}:{pid:04x} at {port_name}");

        let mut port = serialport::new(&port_name, DMX_BAUD)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::Two)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_secs(1))
            .open()?;
        port.write_request_to_send(false)?;

        Ok(Self { port })
    }
}

/// Scans attached serial ports for a matching USB device.
fn find_adapter(
    vid: u16,
    pid: u16,
    description: Option<&str>,
    serial: Option<&str>,
) -> Result<String> {
    for info in serialport::available_ports()? {
        let usb = match &info.port_type {
            SerialPortType::UsbPort(usb) => usb,
            _ => continue,
        };

        if usb.vid != vid || usb.pid != pid {
            continue;
        }
        if let Some(want) = description {
            if usb.product.as_deref() != Some(want) {
                continue;
            }
        }
        if let Some(want) = serial {
            if usb.serial_number.as_deref() != Some(want) {
                continue;
            }
        }

        debug!("matched DMX adapter at {}", info.port_name);
        return Ok(info.port_name);
    }

    Err(LinkError::DeviceNotFound { vid, pid })
}

impl DmxLink for SerialDmxLink {
    fn send_frame(&mut self, frame: &[u8; FRAME_LEN]) -> Result<()> {
        self.port.set_break()?;
        thread::sleep(BREAK_DURATION);
        self.port.clear_break()?;
        thread::sleep(MAB_DURATION);

        self.port.write_all(frame)?;
        self.port.flush()?;

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }
}
