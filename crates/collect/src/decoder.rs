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

//! The content-handler side of collection: learns wire templates,
//! matches them against registered placement templates, compiles and
//! caches decode plans, and dispatches data records through them.

use std::{cell::RefCell, rc::Rc};

use chrono::{LocalResult, TimeZone, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use flowsift_model::InfoModel;

use crate::{
    error::{ErrorContext, ErrorKind},
    options::{DecodeOptions, MatchPolicy},
    parser::{ContentHandler, MessageHeader},
    placement::PlacementTemplate,
    plan::DecodePlan,
    sink::{MessageInfo, PlacementSink},
    template::{TemplateKey, WireTemplate},
    wire::{self, TemplateRecord, TemplateRecordParsingError},
    MIN_MESSAGE_LEN,
};

/// Running totals over a decoder's lifetime.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderStats {
    pub messages: u64,
    pub templates_learned: u64,
    pub templates_superseded: u64,
    pub data_sets: u64,
    pub data_records: u64,
    /// Data sets for which no wire template was known.
    pub skipped_unknown_sets: u64,
    /// Data sets whose wire template matched no placement.
    pub skipped_unmatched_sets: u64,
    /// Format errors that abandoned a set but not the session.
    pub recovered_format_errors: u64,
}

type SharedSink = Rc<RefCell<dyn PlacementSink>>;

/// A cached match: which placement won, and the plan compiled for
/// the pair.
struct CompiledMatch {
    placement_index: usize,
    plan: DecodePlan,
    min_record_length: usize,
}

/// Learns wire templates and places matching data records into
/// caller slots.
///
/// Register placement templates (with their sinks) before parsing
/// starts; registrations must not change while a session runs.
/// Drive the decoder by passing it as the content handler to a
/// [`MessageStreamParser`](crate::MessageStreamParser).
pub struct PlacementDecoder {
    model: InfoModel,
    options: DecodeOptions,
    placements: Vec<(Rc<PlacementTemplate>, SharedSink)>,
    /// Every distinct sink once, in first-registration order, for
    /// session and message callbacks.
    sinks: Vec<SharedSink>,
    unhandled: Option<SharedSink>,
    wire_templates: FxHashMap<TemplateKey, WireTemplate>,
    matches: FxHashMap<TemplateKey, Option<CompiledMatch>>,
    incomplete_warned: FxHashSet<TemplateKey>,
    unknown_warned: FxHashSet<TemplateKey>,
    observation_domain: u32,
    stats: DecoderStats,
}

impl PlacementDecoder {
    pub fn new(model: InfoModel) -> Self {
        Self::with_options(model, DecodeOptions::default())
    }

    pub fn with_options(model: InfoModel, options: DecodeOptions) -> Self {
        Self {
            model,
            options,
            placements: Vec::new(),
            sinks: Vec::new(),
            unhandled: None,
            wire_templates: FxHashMap::default(),
            matches: FxHashMap::default(),
            incomplete_warned: FxHashSet::default(),
            unknown_warned: FxHashSet::default(),
            observation_domain: 0,
            stats: DecoderStats::default(),
        }
    }

    /// Registers a placement template with the sink to call around
    /// each of its records. Registration order is the match
    /// precedence under the first-registered policy.
    pub fn register_placement(&mut self, template: Rc<PlacementTemplate>, sink: SharedSink) {
        self.remember_sink(&sink);
        self.placements.push((template, sink));
    }

    /// Registers the sink whose `unhandled_data_set` hook receives
    /// data sets with no learned wire template.
    pub fn set_unhandled_sink(&mut self, sink: SharedSink) {
        self.remember_sink(&sink);
        self.unhandled = Some(sink);
    }

    fn remember_sink(&mut self, sink: &SharedSink) {
        if !self.sinks.iter().any(|s| Rc::ptr_eq(s, sink)) {
            self.sinks.push(sink.clone());
        }
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn model(&self) -> &InfoModel {
        &self.model
    }

    /// The learned wire template for a `(domain, template id)` pair,
    /// if any.
    pub fn wire_template(&self, key: TemplateKey) -> Option<&WireTemplate> {
        self.wire_templates.get(&key)
    }

    fn key(&self, template_id: u16) -> TemplateKey {
        TemplateKey::new(self.observation_domain, template_id)
    }

    fn learn_set(&mut self, body: &[u8], is_options: bool, offset: u64) -> Result<(), ErrorContext> {
        let records = match wire::parse_template_set(body, is_options) {
            Ok(records) => records,
            Err((at, err @ TemplateRecordParsingError::NomError(_))) => {
                return Err(ErrorContext::fatal(
                    ErrorKind::LongFieldspec,
                    offset + at as u64,
                    err.to_string(),
                ));
            }
            Err((at, err)) => {
                // A malformed template record abandons the set, not
                // the session.
                warn!(offset = offset + at as u64, %err, "abandoning template set");
                self.stats.recovered_format_errors += 1;
                return Ok(());
            }
        };

        for record in records {
            self.learn_template(record, is_options);
        }
        Ok(())
    }

    fn learn_template(&mut self, record: TemplateRecord, is_options: bool) {
        if record.fields.is_empty() {
            trace!(template_id = record.template_id, "ignoring empty template");
            return;
        }

        let mut template = if is_options {
            WireTemplate::with_scope_field_count(record.scope_field_count)
        } else {
            WireTemplate::new()
        };
        for field in &record.fields {
            let ie = match self.model.lookup(field.pen, field.id, field.length) {
                Some(ie) => ie,
                None => {
                    trace!(
                        pen = field.pen,
                        id = field.id,
                        "unknown element, entering into information model"
                    );
                    self.model.add_unknown(field.pen, field.id, field.length)
                }
            };
            template.add(ie);
        }

        let key = self.key(record.template_id);
        match self.wire_templates.get(&key) {
            Some(existing) if *existing == template => {
                trace!(%key, "duplicate template announcement");
            }
            Some(_) => {
                warn!(%key, "overwriting template; invalidating cached match");
                self.matches.remove(&key);
                self.incomplete_warned.remove(&key);
                self.unknown_warned.remove(&key);
                self.wire_templates.insert(key, template);
                self.stats.templates_superseded += 1;
            }
            None => {
                debug!(%key, fields = record.fields.len(), "learned new template");
                self.wire_templates.insert(key, template);
                self.stats.templates_learned += 1;
            }
        }
    }

    /// Picks the placement for a wire template under the configured
    /// policy, compiles the plan, and emits the one-shot incomplete
    /// warning. `None` means no placement is interested (or the pair
    /// refused to compile).
    fn compute_match(&mut self, key: TemplateKey) -> Option<CompiledMatch> {
        let wire = &self.wire_templates[&key];

        let selected = match self.options.match_policy {
            MatchPolicy::FirstRegistered => self
                .placements
                .iter()
                .position(|(pt, _)| pt.is_match(wire) > 0),
            MatchPolicy::MostFieldsMatched => {
                let mut best: Option<(usize, usize)> = None;
                for (index, (pt, _)) in self.placements.iter().enumerate() {
                    let n = pt.is_match(wire);
                    // Strict comparison keeps the earliest on ties.
                    if n > 0 && best.map(|(_, m)| n > m).unwrap_or(true) {
                        best = Some((index, n));
                    }
                }
                best.map(|(index, _)| index)
            }
        }?;

        let placement = &self.placements[selected].0;
        if placement.len() < wire.len() && self.incomplete_warned.insert(key) {
            let unmatched: Vec<String> = wire
                .ies()
                .filter(|ie| placement.lookup(ie).is_none())
                .map(|ie| ie.to_string())
                .collect();
            warn!(
                %key,
                unmatched = %unmatched.join(", "),
                "placement matched but covers a subset; unmatched elements are skipped"
            );
        }

        match DecodePlan::compile(placement, wire, &self.options) {
            Ok(plan) => Some(CompiledMatch {
                placement_index: selected,
                min_record_length: wire.min_length().max(1),
                plan,
            }),
            Err(err) => {
                warn!(%key, %err, "placement matched but plan refused to compile");
                self.stats.recovered_format_errors += 1;
                None
            }
        }
    }

    fn dispatch_records(
        &mut self,
        key: TemplateKey,
        body: &[u8],
        offset: u64,
    ) -> Result<(), ErrorContext> {
        if !self.matches.contains_key(&key) || !self.options.cache_matches {
            let computed = self.compute_match(key);
            self.matches.insert(key, computed);
        }

        let Some(compiled) = &self.matches[&key] else {
            trace!(%key, "no placement interested in this data set");
            self.stats.skipped_unmatched_sets += 1;
            return Ok(());
        };

        let (placement, sink) = &self.placements[compiled.placement_index];
        let mut records = 0u64;
        let mut cur = 0usize;
        while body.len() - cur >= compiled.min_record_length {
            sink.borrow_mut().start_placement(placement)?;
            let consumed = match compiled.plan.execute(&body[cur..]) {
                Ok(n) => n,
                Err(err) => {
                    warn!(
                        %key,
                        offset = offset + (cur + err.offset()) as u64,
                        %err,
                        "abandoning data set"
                    );
                    self.stats.data_records += records;
                    self.stats.recovered_format_errors += 1;
                    return Ok(());
                }
            };
            sink.borrow_mut().end_placement(placement)?;
            cur += consumed;
            records += 1;
        }

        self.stats.data_records += records;
        Ok(())
    }
}

impl ContentHandler for PlacementDecoder {
    fn start_session(&mut self) -> Result<(), ErrorContext> {
        for sink in &self.sinks {
            sink.borrow_mut().start_session()?;
        }
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), ErrorContext> {
        for sink in &self.sinks {
            sink.borrow_mut().end_session()?;
        }
        Ok(())
    }

    fn start_message(&mut self, header: &MessageHeader, offset: u64) -> Result<(), ErrorContext> {
        if header.base_time != 0 {
            return Err(ErrorContext::fatal(
                ErrorKind::IpfixBasetime,
                offset,
                format!("expected base time 0 for IPFIX, got {:#x}", header.base_time),
            ));
        }
        if header.length < MIN_MESSAGE_LEN {
            return Err(ErrorContext::fatal(
                ErrorKind::ShortMessage,
                offset,
                format!(
                    "message must be at least {MIN_MESSAGE_LEN} octets, got {}",
                    header.length
                ),
            ));
        }

        let export_time = match Utc.timestamp_opt(header.export_time as i64, 0) {
            LocalResult::Single(time) => time,
            _ => {
                return Err(ErrorContext::fatal(
                    ErrorKind::FormatError,
                    offset,
                    format!("unrepresentable export time {}", header.export_time),
                ));
            }
        };

        self.observation_domain = header.observation_domain;
        self.stats.messages += 1;

        let info = MessageInfo {
            version: header.version,
            length: header.length,
            export_time,
            sequence_number: header.sequence_number,
            observation_domain: header.observation_domain,
            base_time: header.base_time,
        };
        for sink in &self.sinks {
            sink.borrow_mut().start_message(&info)?;
        }
        Ok(())
    }

    fn end_message(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_template_set(
        &mut self,
        _set_id: u16,
        body: &[u8],
        offset: u64,
    ) -> Result<(), ErrorContext> {
        self.learn_set(body, false, offset)
    }

    fn start_options_template_set(
        &mut self,
        _set_id: u16,
        body: &[u8],
        offset: u64,
    ) -> Result<(), ErrorContext> {
        self.learn_set(body, true, offset)
    }

    fn start_data_set(
        &mut self,
        set_id: u16,
        body: &[u8],
        offset: u64,
    ) -> Result<(), ErrorContext> {
        let key = self.key(set_id);
        self.stats.data_sets += 1;

        if !self.wire_templates.contains_key(&key) {
            if let Some(hook) = self.unhandled.clone() {
                match hook
                    .borrow_mut()
                    .unhandled_data_set(self.observation_domain, set_id, body)
                {
                    Ok(()) => return Ok(()),
                    Err(e) if e.is_again() => {
                        trace!(%key, "second-chance template lookup");
                    }
                    Err(e) => return Err(e.with_template(self.observation_domain, set_id)),
                }
            }
            if !self.wire_templates.contains_key(&key) {
                if self.unknown_warned.insert(key) {
                    warn!(
                        %key,
                        "no template for data set; skipping (this warning appears once per template)"
                    );
                }
                self.stats.skipped_unknown_sets += 1;
                return Ok(());
            }
        }

        self.dispatch_records(key, body, offset)
    }
}
