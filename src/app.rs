use axum::{
    Extension, Form, Router,
    extract::{Path as AxumPath, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::auth::{self, AuthedUser};
use crate::expenses::{self, ExpenditureRecord};
use crate::gpa::{self, CourseEntry, SemesterRecord};
use crate::graph::{self, ChartOptions};
use crate::store::Store;
use crate::todo::TodoItem;

/// Shared application state: the injected document store and the active
/// session map.
pub struct AppState {
    pub store: Store,
    pub sessions: auth::Sessions,
}

/// Starts the web server on the given address over the given store.
pub async fn run(addr: &str, store: Store) -> Result<(), Box<dyn std::error::Error>> {
    store.init()?;

    let app_state = Arc::new(AppState {
        store,
        sessions: auth::Sessions::default(),
    });

    // Pages behind a session
    let protected = Router::new()
        .route("/dashboard", get(serve_dashboard))
        .route("/dashboard/chart.png", get(dashboard_chart))
        .route("/performance", get(serve_performance).post(handle_performance))
        .route("/todo", get(serve_todo).post(handle_add_task))
        .route("/todo/update/:task_id", post(handle_update_task))
        .route("/todo/toggle/:task_id", post(handle_toggle_task))
        .route("/todo/delete/:task_id", post(handle_delete_task))
        .route("/expenses", get(serve_expenses).post(handle_add_expense))
        .route("/expenses/chart.png", get(expenses_chart))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_auth,
        ));

    // Build router
    let app = Router::new()
        .route("/", get(serve_landing))
        .route("/signup", get(serve_signup_page).post(auth::handle_signup))
        .route("/login", get(serve_login_page).post(auth::handle_login))
        .route("/logout", get(auth::handle_logout))
        .merge(protected)
        .nest_service("/static", ServeDir::new("static"))
        .with_state(app_state);

    // Start server
    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn serve_login_page() -> Html<&'static str> {
    Html(include_str!("./static/login.html"))
}

async fn serve_signup_page() -> Html<&'static str> {
    Html(include_str!("./static/signup.html"))
}

/// Splices a JSON payload into a page template before `</head>` so the page
/// script can pick it up as a global constant.
fn render_page(template: &'static str, name: &str, data: &impl Serialize) -> Html<String> {
    let json = serde_json::to_string(data).unwrap_or_else(|_| "null".to_string());
    let page = template.replace(
        "</head>",
        &format!("    <script>const {} = {};</script>\n</head>", name, json),
    );
    Html(page)
}

/// Store faults are the unrecoverable class: log and fail the request.
fn store_fault(e: String) -> Response {
    log::error!("store fault: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
}

// ---- dashboard ----

#[derive(Serialize)]
struct DashboardData {
    user_name: String,
    semester_gpas: std::collections::HashMap<String, f64>,
    semester_names: Vec<String>,
    cgpa_values: Vec<f64>,
}

/// Per-semester CGPA summary with chart data, recomputed from the stored
/// grades on every view.
async fn serve_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
) -> Response {
    let user = match state.store.get_user(&email) {
        Ok(Some(user)) => user,
        Ok(None) => return Redirect::to("/login?error=User+data+not+found.").into_response(),
        Err(e) => return store_fault(e),
    };

    let summary = gpa::aggregate_semesters(&user.semesters);
    render_page(
        include_str!("./static/dashboard.html"),
        "DASHBOARD_DATA",
        &DashboardData {
            user_name: user.name,
            semester_gpas: summary.by_label,
            semester_names: summary.labels,
            cgpa_values: summary.values,
        },
    )
    .into_response()
}

async fn dashboard_chart(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
) -> Response {
    let user = match state.store.get_user(&email) {
        Ok(Some(user)) => user,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return store_fault(e),
    };

    let summary = gpa::aggregate_semesters(&user.semesters);
    if summary.labels.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let options = ChartOptions {
        title: "CGPA by semester".to_string(),
        x_label: "Semester".to_string(),
        y_label: "CGPA".to_string(),
        ..ChartOptions::default()
    };
    match graph::line_chart(&summary.labels, &summary.values, &options) {
        Ok(png) => png_response(png),
        Err(e) => {
            log::error!("dashboard chart render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn png_response(png: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .body(axum::body::Body::from(png))
        .unwrap()
}

// ---- performance ----

/// Validated performance submission, built once from the raw form pairs.
///
/// The form posts `semester` plus one `course_name`/`course_code`/
/// `credit_hours`/`grade`/`attendance` group per course row, so the body is
/// parsed as ordered pairs and zipped into course entries here rather than
/// being re-read field by field.
#[derive(Debug)]
pub struct PerformanceForm {
    pub semester: String,
    pub courses: Vec<CourseEntry>,
}

impl PerformanceForm {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, String> {
        let mut semester = String::new();
        let mut names: Vec<String> = Vec::new();
        let mut codes: Vec<String> = Vec::new();
        let mut credits: Vec<u32> = Vec::new();
        let mut grades: Vec<String> = Vec::new();
        let mut attendance: Vec<Option<String>> = Vec::new();

        for (key, value) in pairs {
            match key.as_str() {
                "semester" => semester = value.clone(),
                "course_name" => names.push(value.clone()),
                "course_code" => codes.push(value.clone()),
                "credit_hours" => match value.parse::<u32>() {
                    Ok(hours) if hours > 0 => credits.push(hours),
                    _ => return Err("Credit hours must be a positive number.".to_string()),
                },
                "grade" => grades.push(value.clone()),
                "attendance" => {
                    attendance.push(if value.is_empty() { None } else { Some(value.clone()) })
                }
                _ => {}
            }
        }

        if semester.is_empty() {
            return Err("Semester is required.".to_string());
        }
        if names.is_empty() {
            return Err("At least one course is required.".to_string());
        }
        if names.len() != codes.len() || names.len() != credits.len() || names.len() != grades.len()
        {
            return Err("Course rows are incomplete.".to_string());
        }
        attendance.resize(names.len(), None);

        let courses = names
            .into_iter()
            .zip(codes)
            .zip(credits)
            .zip(grades)
            .zip(attendance)
            .map(|((((course_name, course_code), credit_hours), grade), attendance)| CourseEntry {
                course_name,
                course_code,
                credit_hours,
                grade,
                attendance,
            })
            .collect();

        Ok(PerformanceForm { semester, courses })
    }
}

#[derive(Serialize)]
struct PerformanceData {
    semesters: Vec<SemesterRecord>,
}

async fn serve_performance(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
) -> Response {
    let user = match state.store.get_user(&email) {
        Ok(Some(user)) => user,
        Ok(None) => return Redirect::to("/login?error=User+data+not+found.").into_response(),
        Err(e) => return store_fault(e),
    };

    render_page(
        include_str!("./static/performance.html"),
        "PERFORMANCE_DATA",
        &PerformanceData {
            semesters: user.semesters,
        },
    )
    .into_response()
}

/// Handles a semester submission: validates the rows, computes the CGPA at
/// insert time and appends the record. Invalid grades are stored as entered;
/// they just don't count toward the average.
async fn handle_performance(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = match PerformanceForm::from_pairs(&pairs) {
        Ok(form) => form,
        Err(e) => {
            return Redirect::to(&format!("/performance?error={}", urlencoding::encode(&e)))
                .into_response();
        }
    };

    let cgpa = gpa::semester_cgpa(&form.courses);
    let record = SemesterRecord {
        semester: form.semester,
        cgpa,
        courses: form.courses,
    };

    match state.store.append_semester(&email, record) {
        Ok(()) => {
            Redirect::to("/performance?success=Courses+added+successfully%21").into_response()
        }
        Err(e) => store_fault(e),
    }
}

// ---- todo ----

#[derive(Deserialize)]
pub struct NewTaskForm {
    pub task_name: String,
}

#[derive(Deserialize)]
pub struct UpdateTaskForm {
    pub new_task_name: String,
}

#[derive(Serialize)]
struct TodoData {
    todos: Vec<TodoItem>,
}

async fn serve_todo(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
) -> Response {
    match state.store.todos_for(&email) {
        Ok(todos) => render_page(
            include_str!("./static/todo.html"),
            "TODO_DATA",
            &TodoData { todos },
        )
        .into_response(),
        Err(e) => store_fault(e),
    }
}

async fn handle_add_task(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
    Form(form): Form<NewTaskForm>,
) -> Response {
    if form.task_name.is_empty() {
        return Redirect::to("/todo").into_response();
    }

    match state.store.insert_todo(TodoItem::new(&email, &form.task_name)) {
        Ok(()) => Redirect::to("/todo?success=Task+added+successfully%21").into_response(),
        Err(e) => store_fault(e),
    }
}

async fn handle_update_task(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
    AxumPath(task_id): AxumPath<String>,
    Form(form): Form<UpdateTaskForm>,
) -> Response {
    if form.new_task_name.is_empty() {
        return Redirect::to("/todo").into_response();
    }

    match state
        .store
        .rename_todo(&email, &task_id, &form.new_task_name)
    {
        Ok(()) => Redirect::to("/todo?success=Task+updated+successfully%21").into_response(),
        Err(e) => store_fault(e),
    }
}

async fn handle_toggle_task(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
    AxumPath(task_id): AxumPath<String>,
) -> Response {
    match state.store.toggle_todo(&email, &task_id) {
        Ok(()) => Redirect::to("/todo").into_response(),
        Err(e) => store_fault(e),
    }
}

async fn handle_delete_task(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
    AxumPath(task_id): AxumPath<String>,
) -> Response {
    match state.store.delete_todo(&email, &task_id) {
        Ok(()) => Redirect::to("/todo?success=Task+deleted+successfully%21").into_response(),
        Err(e) => store_fault(e),
    }
}

// ---- expenses ----

#[derive(Deserialize)]
pub struct ExpenseForm {
    pub title: String,
    pub amount: f64,
    #[serde(default)]
    pub date: String,
    pub category: String,
    pub semester: String,
}

impl ExpenseForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() || self.semester.is_empty() {
            return Err("Title and semester are required.".to_string());
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err("Amount must be zero or more.".to_string());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ExpensesData {
    records: Vec<ExpenditureRecord>,
    summary: expenses::ExpenditureSummary,
}

async fn serve_expenses(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
) -> Response {
    let records = match state.store.expenditures_for(&email) {
        Ok(records) => records,
        Err(e) => return store_fault(e),
    };

    let summary = expenses::aggregate_expenditures(&records);
    render_page(
        include_str!("./static/expenses.html"),
        "EXPENSES_DATA",
        &ExpensesData { records, summary },
    )
    .into_response()
}

async fn handle_add_expense(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    if let Err(e) = form.validate() {
        return Redirect::to(&format!("/expenses?error={}", urlencoding::encode(&e)))
            .into_response();
    }

    let date = if form.date.is_empty() {
        chrono::Local::now().format("%Y-%m-%d").to_string()
    } else {
        form.date
    };

    let record = ExpenditureRecord {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        title: form.title,
        amount: form.amount,
        date,
        category: form.category,
        semester: form.semester,
    };

    match state.store.insert_expenditure(record) {
        Ok(()) => Redirect::to("/expenses?success=Expense+added+successfully%21").into_response(),
        Err(e) => store_fault(e),
    }
}

async fn expenses_chart(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(email)): Extension<AuthedUser>,
) -> Response {
    let records = match state.store.expenditures_for(&email) {
        Ok(records) => records,
        Err(e) => return store_fault(e),
    };

    let summary = expenses::aggregate_expenditures(&records);
    if summary.groups.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let labels: Vec<String> = summary.groups.iter().map(|(label, _)| label.clone()).collect();
    let values: Vec<f64> = summary.groups.iter().map(|(_, total)| *total).collect();

    let options = ChartOptions {
        title: "Spend by semester".to_string(),
        x_label: "Semester".to_string(),
        y_label: "Amount".to_string(),
        ..ChartOptions::default()
    };
    match graph::bar_chart(&labels, &values, &options) {
        Ok(png) => png_response(png),
        Err(e) => {
            log::error!("expenses chart render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
