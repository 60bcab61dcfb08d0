// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use cfn_pipeline_gate::utils::writer::{WriteBuffer, Writer};
use cfn_pipeline_gate::{run_cli, APP_NAME, ERROR_STATUS_CODE};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::process::exit;

#[tokio::main]
async fn main() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Warn).init() {
        eprintln!("{}: could not initialise logging: {}", APP_NAME, e);
    }

    let writer = Writer::new(WriteBuffer::Stdout(std::io::stdout()));
    match run_cli(std::env::args_os(), writer).await {
        Ok((code, _)) => exit(code),
        Err(e) => {
            eprintln!("Error occurred {}", e);
            exit(ERROR_STATUS_CODE);
        }
    }
}
