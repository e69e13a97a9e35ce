//! Command line surface of the bridge.

use clap::Parser;

fn parse_hex_u16(value: &str) -> Result<u16, String> {
    let digits = value.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|err| format!("invalid hex value '{value}': {err}"))
}

/// Bridge OSC control messages onto a DMX512 universe.
#[derive(Parser, Debug)]
#[command(name = "osc2dmx", version, about, disable_version_flag = true)]
pub struct Args {
    /// USB vendor ID of the DMX adapter (hex)
    #[arg(short = 'V', long, value_name = "VID", value_parser = parse_hex_u16, default_value = "0403")]
    pub vid: u16,

    /// USB product ID of the DMX adapter (hex)
    #[arg(short = 'P', long, value_name = "PID", value_parser = parse_hex_u16, default_value = "6001")]
    pub pid: u16,

    /// USB product description to match
    #[arg(short = 'D', long, value_name = "DESCRIPTION")]
    pub description: Option<String>,

    /// USB serial number to match
    #[arg(short = 'S', long, value_name = "SERIAL")]
    pub serial: Option<String>,

    /// DMX frame rate
    #[arg(short = 'F', long, value_name = "FPS", default_value_t = 30,
          value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub fps: u32,

    /// OSC listen URI
    #[arg(short = 'U', long, value_name = "URI", default_value = "osc.udp://:6666")]
    pub uri: String,

    /// Realtime priority of the OSC ingress thread (0 disables)
    #[arg(short = 'I', long, value_name = "PRIORITY", default_value_t = 0)]
    pub input_priority: i32,

    /// Realtime priority of the DMX emitter thread (0 disables)
    #[arg(short = 'O', long, value_name = "PRIORITY", default_value_t = 0)]
    pub output_priority: i32,

    /// Reinitialise the DMX link after fatal transmit errors
    #[arg(short = 'A', long)]
    pub auto_reconnect: bool,

    /// Verbose logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["osc2dmx"]).unwrap();

        assert_eq!(args.vid, 0x0403);
        assert_eq!(args.pid, 0x6001);
        assert_eq!(args.description, None);
        assert_eq!(args.serial, None);
        assert_eq!(args.fps, 30);
        assert_eq!(args.uri, "osc.udp://:6666");
        assert_eq!(args.input_priority, 0);
        assert_eq!(args.output_priority, 0);
        assert!(!args.auto_reconnect);
        assert!(!args.debug);
    }

    #[test]
    fn test_hex_ids() {
        let args = Args::try_parse_from(["osc2dmx", "-V", "16c0", "-P", "0x05dc"]).unwrap();

        assert_eq!(args.vid, 0x16c0);
        assert_eq!(args.pid, 0x05dc);
    }

    #[test]
    fn test_rejects_zero_fps() {
        assert!(Args::try_parse_from(["osc2dmx", "-F", "0"]).is_err());
    }

    #[test]
    fn test_rejects_bad_hex() {
        assert!(Args::try_parse_from(["osc2dmx", "-V", "xyzz"]).is_err());
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from(["osc2dmx", "-A", "-d", "-F", "44", "-O", "70"]).unwrap();

        assert!(args.auto_reconnect);
        assert!(args.debug);
        assert_eq!(args.fps, 44);
        assert_eq!(args.output_priority, 70);
    }
}
