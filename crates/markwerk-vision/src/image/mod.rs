// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — loading, cropping, rotation, and export of sheet photos.

pub mod processor;

pub use processor::SheetImage;
