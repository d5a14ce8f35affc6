// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod config;
pub mod doctor;
pub mod importer;
pub mod portfolio;
pub mod transactions;
pub mod users;
pub mod wishlist;
