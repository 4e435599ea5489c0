//! Sample flow log payloads shared by the unit tests.

use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("fixtures are always objects"),
    }
}

/// A minimal valid payload with the given connection tuple.
pub fn payload(
    src_ip: &str,
    dest_ip: &str,
    src_port: u16,
    dest_port: u16,
    protocol: u8,
) -> Map<String, Value> {
    object(json!({
        "connection": {
            "src_ip": src_ip,
            "dest_ip": dest_ip,
            "src_port": src_port,
            "dest_port": dest_port,
            "protocol": protocol,
        },
        "start_time": "2018-04-03T13:47:31Z",
        "end_time": "2018-04-03T13:48:33Z",
    }))
}

pub fn sample_payloads() -> Vec<Map<String, Value>> {
    vec![
        object(json!({
            "bytes_sent": "491",
            "connection": {
                "dest_ip": "192.0.2.2",
                "dest_port": 3389.0,
                "protocol": 6.0,
                "src_ip": "198.51.100.75",
                "src_port": 49444.0,
            },
            "dest_instance": {
                "project_id": "yoyodyne-102010",
                "region": "us-west1",
                "vm_name": "vm-instance-01",
                "zone": "us-west1-a",
            },
            "dest_vpc": {
                "project_id": "yoyodyne-102010",
                "subnetwork_name": "yoyo-vpc-1",
                "subnetwork_region": "sunnydale1",
                "vpc_name": "yoyo-vpc-1",
            },
            "end_time": "2018-04-03T13:47:38.401Z",
            "packets_sent": "4",
            "reporter": "DEST",
            "src_location": {
                "city": "Santa Teresa",
                "continent": "America",
                "country": "usa",
                "region": "California",
            },
            "start_time": "2018-04-03T13:47:37.301723960Z",
            "rtt_msec": "61",
        })),
        object(json!({
            "bytes_sent": "756",
            "connection": {
                "dest_ip": "198.51.100.75",
                "dest_port": 49444.0,
                "protocol": 6.0,
                "src_ip": "192.0.2.2",
                "src_port": 3389.0,
            },
            "dest_location": {
                "city": "Santa Teresa",
                "continent": "America",
                "country": "usa",
                "region": "California",
            },
            "end_time": "2018-04-03T13:47:33.937764566Z",
            "packets_sent": "6",
            "reporter": "SRC",
            "src_instance": {
                "project_id": "yoyodyne-102010",
                "region": "us-west1",
                "vm_name": "vm-instance-01",
                "zone": "us-west1-a",
            },
            "src_vpc": {
                "project_id": "yoyodyne-102010",
                "subnetwork_name": "yoyo-vpc-1",
                "subnetwork_region": "sunnydale2",
                "vpc_name": "yoyo-vpc-1",
            },
            "start_time": "2018-04-03T13:47:32.805417512Z",
        })),
        object(json!({
            "bytes_sent": "1020",
            "connection": {
                "dest_ip": "192.0.2.3",
                "dest_port": 65535.0,
                "protocol": 6.0,
                "src_ip": "192.0.2.2",
                "src_port": 3389.0,
            },
            "end_time": "2018-04-03T13:48:33.937764566Z",
            "packets_sent": "20",
            "reporter": "SRC",
            "start_time": "2018-04-03T13:47:31.805417512Z",
        })),
    ]
}

/// An ICMP flow as logged: the connection has no ports.
pub fn icmp_payload() -> Map<String, Value> {
    let vpc = json!({
        "project_id": "yoyodyne-102010",
        "subnetwork_name": "yoyo-vpc-1",
        "vpc_name": "yoyo-vpc-1",
    });
    object(json!({
        "bytes_sent": "1020",
        "connection": {
            "dest_ip": "192.0.2.3",
            "protocol": 1.0,
            "src_ip": "192.0.2.2",
        },
        "end_time": "2018-04-03T13:48:33.937764566Z",
        "packets_sent": "20",
        "reporter": "SRC",
        "start_time": "2018-04-03T13:47:31.805417512Z",
        "src_instance": {
            "project_id": "yoyodyne-102010",
            "region": "us-west1",
            "vm_name": "vm-instance-01",
            "zone": "us-west1-a",
        },
        "src_vpc": vpc.clone(),
        "dest_instance": {
            "project_id": "yoyodyne-102010",
            "region": "us-west1",
            "vm_name": "vm-instance-02",
            "zone": "us-west1-a",
        },
        "dest_vpc": vpc,
    }))
}
