//! Parses terminal command lines into [`UiEvent`]s.

use devpanel_protocol::ChannelId;
use devpanel_protocol::constants::MAX_BRIGHTNESS;
use devpanel_settings::ConfigField;

use crate::message::UiEvent;

pub const HELP: &str = "\
led <1|2> on|off            led <1|2> brightness <0-100>
relay add <name> <gpio>     relay toggle <n>
relay delete <n>            relay confirm | relay cancel
relay list                  config show | config load | config save
config set <field> <value>  status | help | quit

config fields: ssid, wifi_password, server, port, client_id, username, secret";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<UiEvent>, String> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let event = match command {
        "led" => parse_led(&words.collect::<Vec<_>>())?,
        "relay" => parse_relay(&words.collect::<Vec<_>>())?,
        "config" => parse_config(line)?,
        "status" => UiEvent::Status,
        "help" | "?" => UiEvent::Help,
        "quit" | "exit" => UiEvent::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(event))
}

fn parse_channel(word: Option<&&str>) -> Result<ChannelId, String> {
    let word = word.ok_or("missing channel number")?;
    word.parse::<u8>()
        .ok()
        .and_then(|n| ChannelId::try_from(n).ok())
        .ok_or_else(|| format!("no such channel: {word} (use 1 or 2)"))
}

fn parse_led(args: &[&str]) -> Result<UiEvent, String> {
    let channel = parse_channel(args.first())?;
    match args.get(1..) {
        Some(["on"]) => Ok(UiEvent::LedSwitch { channel, on: true }),
        Some(["off"]) => Ok(UiEvent::LedSwitch { channel, on: false }),
        Some(["brightness", value]) => {
            let value = value
                .parse::<u32>()
                .map_err(|_| format!("brightness must be a number, got {value}"))?;
            Ok(UiEvent::LedBrightness {
                channel,
                value: value.min(u32::from(MAX_BRIGHTNESS)) as u8,
            })
        }
        _ => Err("usage: led <1|2> on|off | led <1|2> brightness <0-100>".into()),
    }
}

fn parse_position(word: Option<&&str>) -> Result<usize, String> {
    let word = word.ok_or("missing relay number")?;
    word.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("relay number must be 1 or more, got {word}"))
}

fn parse_relay(args: &[&str]) -> Result<UiEvent, String> {
    match args.first().copied() {
        // The last word is the pin; everything before it is the name.
        Some("add") => {
            let rest = &args[1..];
            let (name, gpio) = match rest {
                [] => (String::new(), String::new()),
                [name] => ((*name).to_string(), String::new()),
                [name @ .., gpio] => (name.join(" "), (*gpio).to_string()),
            };
            Ok(UiEvent::RelayAdd { name, gpio })
        }
        Some("toggle") => Ok(UiEvent::RelayToggle(parse_position(args.get(1))?)),
        Some("delete") => Ok(UiEvent::RelayDelete(parse_position(args.get(1))?)),
        Some("confirm") => Ok(UiEvent::RelayConfirmDelete),
        Some("cancel") => Ok(UiEvent::RelayCancelDelete),
        Some("list") | None => Ok(UiEvent::RelayList),
        Some(other) => Err(format!("unknown relay command: {other}")),
    }
}

/// Takes the whole line so `config set` values keep their inner spaces.
fn parse_config(line: &str) -> Result<UiEvent, String> {
    let rest = line.strip_prefix("config").unwrap_or(line).trim_start();
    let (sub, rest) = split_word(rest);
    match sub {
        "show" | "" => Ok(UiEvent::ConfigShow),
        "load" => Ok(UiEvent::ConfigLoad),
        "save" => Ok(UiEvent::ConfigSave),
        "set" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                return Err("usage: config set <field> <value>".into());
            }
            Ok(UiEvent::ConfigSet {
                field: field.parse::<ConfigField>()?,
                value: value.to_string(),
            })
        }
        other => Err(format!("unknown config command: {other}")),
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}
