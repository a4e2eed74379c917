//! Output formatting for command replies.

use std::io::{self, Write};

use crate::cli::args::OutputFormat;
use crate::command::Reply;

/// Write one reply followed by a newline.
pub fn write_reply<W: Write>(
    out: &mut W,
    reply: &Reply,
    format: OutputFormat,
    pretty: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = reply.to_json();
            let rendered = if pretty {
                serde_json::to_string_pretty(&value)
            } else {
                serde_json::to_string(&value)
            }
            .map_err(io::Error::other)?;
            writeln!(out, "{rendered}")
        }
        OutputFormat::Human => match reply {
            Reply::Ok => writeln!(out, "OK"),
            Reply::Integer { value } => writeln!(out, "(integer) {value}"),
            Reply::Json { value } if pretty => {
                let rendered = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
                writeln!(out, "{rendered}")
            }
            Reply::Json { value } => writeln!(out, "{value}"),
            Reply::Error { code, message } => writeln!(out, "(error) {code} {message}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(reply: &Reply, format: OutputFormat, pretty: bool) -> String {
        let mut out = Vec::new();
        write_reply(&mut out, reply, format, pretty).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_json_output() {
        assert_eq!(render(&Reply::Ok, OutputFormat::Json, false), "\"OK\"\n");
        let reply = Reply::json(json!({"total": 1}));
        assert_eq!(render(&reply, OutputFormat::Json, false), "{\"total\":1}\n");
        assert_eq!(
            render(&reply, OutputFormat::Json, true),
            "{\n  \"total\": 1\n}\n"
        );
    }

    #[test]
    fn test_human_output() {
        assert_eq!(render(&Reply::Ok, OutputFormat::Human, false), "OK\n");
        assert_eq!(
            render(&Reply::Integer { value: 2 }, OutputFormat::Human, false),
            "(integer) 2\n"
        );
        let error = Reply::Error {
            code: "ERR_TIMEOUT".to_string(),
            message: "Timeout: deadline exceeded".to_string(),
        };
        assert_eq!(
            render(&error, OutputFormat::Human, false),
            "(error) ERR_TIMEOUT Timeout: deadline exceeded\n"
        );
    }
}
