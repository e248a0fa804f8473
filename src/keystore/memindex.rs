/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! In-memory [`SetterIndex`] implementation. Reference tooling for running
//! the key store standalone and in tests, not a production storage engine
//! (the real backend, "librarian", is an external collaborator).

use std::collections::HashMap;

use async_trait::async_trait;
use log::trace;
use smol::lock::Mutex;

use super::SetterIndex;
use crate::error::Result;

#[derive(Default)]
pub struct MemIndex {
    map: Mutex<HashMap<Vec<u8>, Vec<Vec<u8>>>>,
}

impl MemIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SetterIndex for MemIndex {
    async fn get(&self, addr: &[u8]) -> Result<Option<Vec<Vec<u8>>>> {
        trace!(target: "keystore::memindex", "get {} byte address", addr.len());
        Ok(self.map.lock().await.get(addr).cloned())
    }

    async fn set(&self, addr: &[u8], value: Vec<Vec<u8>>) -> Result<()> {
        trace!(target: "keystore::memindex", "set {} byte address", addr.len());
        self.map.lock().await.insert(addr.to_vec(), value);
        Ok(())
    }

    async fn delete(&self, addr: &[u8]) -> Result<()> {
        trace!(target: "keystore::memindex", "delete {} byte address", addr.len());
        self.map.lock().await.remove(addr);
        Ok(())
    }
}
