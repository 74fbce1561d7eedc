/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Gate lifecycle states and the legal transitions between them.

use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateState {
    /// Constructor-only initial state.
    Start,
    Init,
    Operate,
    Error,
    Shutdown,
    /// Terminal.
    Deleted,
}

impl GateState {
    pub fn is_operational(self) -> bool {
        self == GateState::Operate
    }

    /// `true` once shutdown has been requested.
    pub fn is_closing(self) -> bool {
        matches!(self, GateState::Shutdown | GateState::Deleted)
    }

    pub(crate) fn can_transition_to(self, next: GateState) -> bool {
        use GateState::*;

        matches!(
            (self, next),
            (Start, Init)
                | (Init, Operate)
                | (Init, Error)
                | (Operate, Error)
                | (Error, Operate)
                | (Start | Init | Operate | Error, Shutdown)
                | (Shutdown, Deleted)
        )
    }
}

impl Display for GateState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GateState::Start => "START",
            GateState::Init => "INIT",
            GateState::Operate => "OPERATE",
            GateState::Error => "ERROR",
            GateState::Shutdown => "SHUTDOWN",
            GateState::Deleted => "DELETED",
        };
        f.write_str(name)
    }
}
