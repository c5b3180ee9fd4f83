// Copyright (C) 2024-present The FlowSift Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use flowsift_collect::{DecodeOptions, DecodePlan, PlacementTemplate, WireTemplate};
use flowsift_model::InfoModel;

/// One flow record of the classic five-tuple plus counters, with the
/// ports left unplaced so the plan carries a coalesced skip.
fn five_tuple_plan() -> (DecodePlan, Vec<u8>) {
    let model = InfoModel::default_ipfix();

    let mut wire = WireTemplate::new();
    for (id, len) in [(8u16, 4u16), (12, 4), (7, 2), (11, 2), (4, 1), (2, 4), (1, 4)] {
        wire.add(model.lookup(0, id, len).unwrap());
    }

    let mut placement = PlacementTemplate::new();
    let _sip = placement.bind_u32("sourceIPv4Address", &model).unwrap();
    let _dip = placement.bind_u32("destinationIPv4Address", &model).unwrap();
    let _proto = placement.bind_u8("protocolIdentifier", &model).unwrap();
    let _packets = placement.bind_u64("packetDeltaCount", &model).unwrap();
    let _octets = placement.bind_u64("octetDeltaCount", &model).unwrap();

    let plan = DecodePlan::compile(&placement, &wire, &DecodeOptions::default()).unwrap();

    let record = vec![
        0xc0, 0xa8, 0x00, 0x01, // 192.168.0.1
        0x0a, 0x00, 0x00, 0x02, // 10.0.0.2
        0xd4, 0x31, // sport
        0x01, 0xbb, // dport
        0x06, // tcp
        0x00, 0x00, 0x04, 0x00, // 1024 packets
        0x00, 0x10, 0x00, 0x00, // octets
    ];
    (plan, record)
}

fn bench_execute(c: &mut Criterion) {
    let (plan, record) = five_tuple_plan();
    c.bench_function("decode five-tuple record", |b| {
        b.iter(|| plan.execute(black_box(&record)).unwrap())
    });
}

criterion_group!(benches, bench_execute);
criterion_main!(benches);
