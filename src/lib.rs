/*!
# Student Hub

A student-facing web application for tracking academic performance, personal
tasks and expenses, built in Rust.

## Overview

Students sign up with their university details, record their courses and
grades semester by semester, keep a personal to-do list, and log their
expenses. The application computes a credit-weighted CGPA per semester and
aggregates spending per semester, rendering both as charts.

## Architecture

The application is a conventional server-rendered web app:

### Web Layer
- **Technologies**: axum, cookie sessions, HTML templates with injected JSON
- **Key Components**:
  - Router and form handlers (`app`)
  - Authentication and session management (`auth`)
  - Chart rendering to PNG (`graph`)

### Domain Layer
- **Core Components**:
  - Grade point table and CGPA calculator (`gpa`)
  - Semester aggregator - folds all stored semester records into one CGPA
    per semester label for the dashboard
  - Expenditure aggregator (`expenses`) - per-semester totals with max/min
    spending semester detection
  - To-do items (`todo`)

### Data Persistence Layer
- JSON-file document store (`store`) with three collections: users (keyed by
  email), to-dos and expenditures (uuid ids, owner-scoped by email)
- One file per collection, independent read/write per operation, last write
  wins

## Modules

- **gpa**: Grade point table, per-submission CGPA, cross-semester aggregation
- **expenses**: Expenditure records and per-semester spending summary
- **todo**: Personal to-do items
- **store**: JSON-file document store for the three collections
- **auth**: Users, signup/login, cookie sessions, auth middleware
- **graph**: Line/bar chart generation with plotters
- **app**: Routing, page rendering and form handling

## Routes

- `/`, `/signup`, `/login`, `/logout` - public pages
- `/dashboard` - per-semester CGPA summary and chart
- `/performance` - semester and course entry
- `/todo` - to-do list with update/toggle/delete
- `/expenses` - expense entry and per-semester aggregation
- `/dashboard/chart.png`, `/expenses/chart.png` - server-rendered charts
*/

// Re-export all modules so they appear in the documentation
pub mod app;
pub mod auth;
pub mod expenses;
pub mod gpa;
pub mod graph;
pub mod store;
pub mod todo;

/// Re-export everything from these modules to make it easier to use
pub use auth::*;
pub use expenses::*;
pub use gpa::*;
pub use store::*;
pub use todo::*;
