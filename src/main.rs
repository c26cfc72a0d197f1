// dkim-keylen – DKIM public key length checker
// Copyright © 2022–2023 David Bürgin <dbuergin@gluet.ch>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

use clap::{Parser, ValueEnum};
use dkim_keylen::{check_key, lookup, DkimQuery, InspectError, OutputFormat};
use std::{
    io::{self, Write},
    net::{IpAddr, SocketAddr},
    process::ExitCode,
    time::Duration,
};
use tokio::runtime;
use tracing_subscriber::EnvFilter;

/// Look up a DKIM public key record in DNS and report the key length.
#[derive(Debug, Parser)]
#[command(name = "dkim-keylen", version)]
struct Args {
    /// The DKIM selector
    selector: String,

    /// The signing domain
    domain: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    output: Format,

    /// Nameserver to query, as IP address or socket address
    #[arg(short, long, value_name = "ADDR", value_parser = parse_nameserver)]
    nameserver: Option<SocketAddr>,

    /// Lookup timeout in seconds
    #[arg(short, long, value_name = "SECONDS", default_value = "5", value_parser = parse_timeout)]
    timeout: Duration,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => Self::Text,
            Format::Json => Self::Json,
        }
    }
}

fn parse_nameserver(s: &str) -> Result<SocketAddr, String> {
    s.parse()
        .or_else(|_| s.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, 53)))
        .map_err(|_| format!("invalid nameserver address: {s}"))
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("invalid timeout: {s}"))?;

    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(format!("timeout must be a positive number of seconds: {s}")),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut query = DkimQuery::new(args.selector, args.domain).with_timeout(args.timeout);
    if let Some(nameserver) = args.nameserver {
        query = query.with_nameserver(nameserver);
    }

    let format = args.output.into();

    let runtime = match runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let output = runtime.block_on(async {
        match lookup::new_resolver(query.nameserver, query.timeout) {
            Ok(resolver) => check_key(&resolver, &query, format).await,
            Err(e) => {
                let result = Err(InspectError::Dns(e));
                dkim_keylen::inspect::render_result(&query, &result, format)
            }
        }
    });

    // nothing to do about failure to write to stdout or stderr
    let _ = io::stdout().write_all(output.stdout.as_bytes());
    let _ = io::stderr().write_all(output.stderr.as_bytes());

    if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_output_format() {
        let args = Args::try_parse_from(["dkim-keylen", "sel", "example.com"]).unwrap();
        assert_eq!(OutputFormat::from(args.output), OutputFormat::Text);

        let args = Args::try_parse_from(["dkim-keylen", "-o", "json", "sel", "example.com"]);
        assert_eq!(OutputFormat::from(args.unwrap().output), OutputFormat::Json);

        assert!(Args::try_parse_from(["dkim-keylen", "-o", "xml", "sel", "example.com"]).is_err());
    }

    #[test]
    fn args_nameserver_and_timeout() {
        let args = Args::try_parse_from([
            "dkim-keylen", "-n", "192.0.2.53", "-t", "2.5", "sel", "example.com",
        ])
        .unwrap();

        assert_eq!(args.nameserver, Some("192.0.2.53:53".parse().unwrap()));
        assert_eq!(args.timeout, Duration::from_millis(2500));
        assert!(Args::try_parse_from(["dkim-keylen", "-t", "0", "sel", "example.com"]).is_err());
    }
}
