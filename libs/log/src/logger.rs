// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// sysMaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//!
use log::{Level, LevelFilter, Log};
use std::{
    fs::{File, OpenOptions},
    io::{Error, Write},
    sync::Mutex,
};

const KMSG_PATH: &str = "/dev/kmsg";

fn write_msg_common(writer: &mut impl Write, name: &str, msg: String) {
    let time: libc::time_t = unsafe { libc::time(std::ptr::null_mut()) };
    let now = unsafe { libc::localtime(&time) };
    let now_str = if now.is_null() {
        String::new()
    } else {
        unsafe {
            format!(
                "{:0>4}-{:0>2}-{:0>2} {:0>2}:{:0>2}:{:0>2} ",
                (*now).tm_year + 1900, /* tm_year is years since 1900 */
                (*now).tm_mon + 1,     /* tm_mon is months since Jan: [0, 11] */
                (*now).tm_mday,
                (*now).tm_hour,
                (*now).tm_min,
                (*now).tm_sec
            )
        }
    };

    /* One write per record, so lines from different records never interleave. */
    let line = format!("{}{}: {}\n", now_str, name, msg);
    if let Err(e) = writer.write_all(line.as_bytes()) {
        eprintln!("Failed to log message: {}", e);
    }
}

/// syslog priority of the record level, as understood by /dev/kmsg
fn kmsg_priority(level: Level) -> u8 {
    match level {
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info => 6,
        Level::Debug | Level::Trace => 7,
    }
}

struct ConsoleLogger {
    name: String,
}

impl Log for ConsoleLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let mut stderr = std::io::stderr();
        write_msg_common(&mut stderr, &self.name, record.args().to_string());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

struct KmsgLogger {
    name: String,
    file: Mutex<File>,
}

impl KmsgLogger {
    fn new(name: &str) -> Result<Self, Error> {
        let file = OpenOptions::new().write(true).open(KMSG_PATH)?;
        Ok(Self {
            name: name.to_string(),
            file: Mutex::new(file),
        })
    }
}

/* The kernel treats every write as one record: "<pri>ident[pid]: message". */
impl Log for KmsgLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let msg = format!(
            "<{}>{}[{}]: {}\n",
            kmsg_priority(record.level()),
            self.name,
            std::process::id(),
            record.args()
        );

        let mut file = match self.file.lock() {
            Err(_) => return,
            Ok(v) => v,
        };
        if let Err(e) = file.write_all(msg.as_bytes()) {
            eprintln!("Failed to write message to {}: {}", KMSG_PATH, e);
        }
    }

    fn flush(&self) {}
}

struct CombinedLogger {
    loggers: Vec<Box<dyn Log>>,
}

impl CombinedLogger {
    fn new() -> Self {
        Self {
            loggers: Vec::new(),
        }
    }

    fn push(&mut self, logger: Box<dyn Log>) {
        self.loggers.push(logger);
    }

    fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl Log for CombinedLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        for logger in &self.loggers {
            logger.log(record);
        }
    }

    fn flush(&self) {
        for logger in &self.loggers {
            logger.flush();
        }
    }
}

/// Initialize the global logger.
///
/// * `name` - The program name, used as the identifier of every message.
/// * `level` - Log message level.
/// * `targets` - A set of log targets, "console" and/or "kmsg".
///
/// If no target can be opened, messages fall back to the console.
pub fn init_log(name: &str, level: LevelFilter, targets: Vec<&str>) {
    let mut combined_loggers = CombinedLogger::new();

    for target in targets {
        let logger = match target {
            "console" => Box::new(ConsoleLogger {
                name: name.to_string(),
            }) as Box<dyn Log>,
            "kmsg" => match KmsgLogger::new(name) {
                Ok(logger) => Box::new(logger) as Box<dyn Log>,
                Err(e) => {
                    eprintln!("{} failed to open {}: {}", name, KMSG_PATH, e);
                    continue;
                }
            },
            _ => {
                eprintln!("{}: log target '{}' is strange, ignoring.", name, target);
                continue;
            }
        };

        combined_loggers.push(logger);
    }

    if combined_loggers.is_empty() {
        combined_loggers.push(Box::new(ConsoleLogger {
            name: name.to_string(),
        }));
    }

    if let Err(e) = log::set_boxed_logger(Box::new(combined_loggers)) {
        eprintln!("{}: failed to set global logger: {}", name, e);
        return;
    }

    log::set_max_level(level);
}
