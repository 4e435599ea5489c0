//! Tab-separated output.

use std::io::{self, Write};

use crate::flow_record::FlowRecord;

pub const HEADER: [&str; 9] = [
    "src_ip",
    "dest_ip",
    "src_port",
    "dest_port",
    "protocol",
    "start_time",
    "end_time",
    "bytes_sent",
    "packets_sent",
];

const ROW_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn write_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", HEADER.join("\t"))
}

pub fn write_row<W: Write>(out: &mut W, record: &FlowRecord) -> io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        record.src_ip,
        record.dest_ip,
        record.src_port,
        record.dest_port,
        record.protocol,
        record.start_time.format(ROW_TIME_FORMAT),
        record.end_time.format(ROW_TIME_FORMAT),
        record.bytes_sent,
        record.packets_sent
    )
}
