use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::controller::{
    AddOutcome, Confirm, DeleteOutcome, DeletePrompt, DialogError, ListController, NewItemSource,
};
use crate::filter::Filter;
use crate::model::{parse_deadline, TodoItem};
use crate::render::RowStyle;
use crate::storage::{init_project_file, load_items, locate, save_items, DataLocation};
use crate::store::StoreHandle;
use crate::ui;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub fn init() -> Result<()> {
    let location = init_project_file()?;
    println!("Initialized items file at {}", location.path.display());
    Ok(())
}

pub fn list(config: &Config, today_only: bool) -> Result<()> {
    let (store, location) = load_current_store(config)?;
    let controller = open_controller(&store, today_only);
    println!(
        "Items ({}, {} list): {}",
        location.scope.label(),
        controller.filter().label(),
        location.path.display()
    );
    let visible = controller.visible_items();
    if store.borrow().is_empty() {
        println!("  (empty)");
    } else if visible.is_empty() {
        println!("  (nothing due today)");
    }
    let today = SystemClock.today();
    for (row, (_, item)) in visible.iter().enumerate() {
        print_item(row + 1, item, today);
    }
    Ok(())
}

pub fn add(
    config: &Config,
    short_description: Option<String>,
    details: String,
    deadline: Option<String>,
    from: Option<PathBuf>,
) -> Result<()> {
    let (store, location) = load_current_store(config)?;
    let mut controller = open_controller(&store, false);
    let outcome = match from {
        Some(path) => controller.add_item(&mut FileItemSource { path }),
        None => controller.add_item(&mut ArgsItemSource {
            short_description: short_description.unwrap_or_default(),
            details,
            deadline,
            today: SystemClock.today(),
        }),
    };
    match outcome.context("adding item")? {
        AddOutcome::Added(_) => {
            save_items(&location, &store.borrow())?;
            if let Some(item) = controller.selected_item() {
                println!(
                    "Added \"{}\" due {}",
                    item.short_description,
                    item.long_deadline()
                );
            }
        }
        AddOutcome::Cancelled => println!("Nothing added"),
    }
    Ok(())
}

pub fn delete(config: &Config, row: usize, today_only: bool, yes: bool) -> Result<()> {
    let (store, location) = load_current_store(config)?;
    let mut controller = open_controller(&store, today_only);
    let mut confirm: Box<dyn Confirm> = if yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(PromptConfirm {
            input: io::stdin().lock(),
            output: io::stdout(),
        })
    };
    let outcome = match row.checked_sub(1) {
        Some(idx) => controller.context_delete(idx, confirm.as_mut()),
        None => None,
    };
    let Some(outcome) = outcome else {
        bail!(
            "no row {} in the {} list ({} items)",
            row,
            controller.filter().label(),
            controller.projection().len()
        );
    };
    match outcome {
        DeleteOutcome::Deleted(item) => {
            save_items(&location, &store.borrow())?;
            println!("Deleted \"{}\"", item.short_description);
        }
        DeleteOutcome::Cancelled => println!("Delete canceled"),
        DeleteOutcome::Missing => bail!("row {} is no longer present", row),
    }
    Ok(())
}

pub fn tui(config: &Config) -> Result<()> {
    let (store, location) = load_current_store(config)?;
    ui::run(store, location, config.list_height())
}

fn load_current_store(config: &Config) -> Result<(StoreHandle, DataLocation)> {
    let cwd = env::current_dir()?;
    let location = locate(&cwd, config.data_file.as_deref())?;
    let store = load_items(&location)?;
    Ok((store.into_handle(), location))
}

fn open_controller(store: &StoreHandle, today_only: bool) -> ListController {
    let mut controller = ListController::new(store.clone(), Box::new(SystemClock));
    if today_only {
        controller.set_filter(Filter::TodayOnly);
    }
    controller
}

fn print_item(row: usize, item: &TodoItem, today: NaiveDate) {
    let marker = match crate::render::row_style(item, today) {
        RowStyle::Overdue => " (overdue)",
        RowStyle::DueTomorrow => " (due tomorrow)",
        RowStyle::Default => "",
    };
    println!(
        "  {:>2}. {} - {}{}",
        row,
        item.short_description,
        item.long_deadline(),
        marker
    );
    if !item.details.is_empty() {
        for line in item.details.lines() {
            println!("      {}", line);
        }
    }
}

/// New item built from command line arguments.
struct ArgsItemSource {
    short_description: String,
    details: String,
    deadline: Option<String>,
    today: NaiveDate,
}

impl NewItemSource for ArgsItemSource {
    fn collect_new_item(&mut self) -> Result<Option<TodoItem>, DialogError> {
        let deadline = match self.deadline.as_deref() {
            Some(raw) => parse_deadline(raw)?,
            None => self.today,
        };
        let item = TodoItem::new(
            self.short_description.clone(),
            self.details.clone(),
            deadline,
        )?;
        Ok(Some(item))
    }
}

/// New item read from a YAML document with the same fields as the items
/// file entries.
struct FileItemSource {
    path: PathBuf,
}

impl NewItemSource for FileItemSource {
    fn collect_new_item(&mut self) -> Result<Option<TodoItem>, DialogError> {
        let resource = self.path.display().to_string();
        let data = fs::read_to_string(&self.path).map_err(|err| DialogError::ResourceLoad {
            resource: resource.clone(),
            reason: err.to_string(),
        })?;
        let item: TodoItem =
            serde_yaml::from_str(&data).map_err(|err| DialogError::ResourceLoad {
                resource,
                reason: err.to_string(),
            })?;
        item.validate()?;
        Ok(Some(item))
    }
}

struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &DeletePrompt) -> bool {
        true
    }
}

struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &DeletePrompt) -> bool {
        let asked = writeln!(self.output, "{}\n{}", prompt.title, prompt.header)
            .and_then(|_| write!(self.output, "{} [y/N] ", prompt.body))
            .and_then(|_| self.output.flush());
        if asked.is_err() {
            return false;
        }
        let mut answer = String::new();
        if self.input.read_line(&mut answer).is_err() {
            return false;
        }
        matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes" | "ok"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemError, ItemId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn prompt() -> DeletePrompt {
        DeletePrompt {
            target: ItemId(0),
            title: "Delete Todo Item".into(),
            header: "Delete Item: Buy water".into(),
            body: "Are you sure? Press OK to confirm, or Cancel".into(),
        }
    }

    #[test]
    fn args_source_defaults_deadline_to_today() {
        let mut source = ArgsItemSource {
            short_description: "Buy water".into(),
            details: String::new(),
            deadline: None,
            today: date(2022, 4, 25),
        };
        let item = source.collect_new_item().unwrap().unwrap();
        assert_eq!(item.deadline, date(2022, 4, 25));
    }

    #[test]
    fn args_source_rejects_bad_input() {
        let mut source = ArgsItemSource {
            short_description: "Buy water".into(),
            details: String::new(),
            deadline: Some("tomorrow".into()),
            today: date(2022, 4, 25),
        };
        assert!(matches!(
            source.collect_new_item(),
            Err(DialogError::Invalid(ItemError::InvalidDeadline(_)))
        ));
        source.deadline = None;
        source.short_description = " ".into();
        assert!(matches!(
            source.collect_new_item(),
            Err(DialogError::Invalid(ItemError::MissingDescription))
        ));
    }

    #[test]
    fn missing_item_file_is_a_resource_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileItemSource {
            path: dir.path().join("absent.yml"),
        };
        assert!(matches!(
            source.collect_new_item(),
            Err(DialogError::ResourceLoad { .. })
        ));
    }

    #[test]
    fn item_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("item.yml");
        fs::write(
            &path,
            "short_description: Mail birthday card\ndetails: For John\ndeadline: 2022-04-25\n",
        )
        .unwrap();
        let item = FileItemSource { path }.collect_new_item().unwrap().unwrap();
        assert_eq!(item.short_description, "Mail birthday card");
        assert_eq!(item.details, "For John");
        assert_eq!(item.deadline, date(2022, 4, 25));
    }

    #[test]
    fn prompt_confirm_needs_an_explicit_yes() {
        for (answer, expected) in [("y\n", true), ("OK\n", true), ("\n", false), ("no\n", false)] {
            let mut output = Vec::new();
            let mut confirm = PromptConfirm {
                input: answer.as_bytes(),
                output: &mut output,
            };
            assert_eq!(confirm.confirm(&prompt()), expected, "answer {answer:?}");
            let shown = String::from_utf8(output).unwrap();
            assert!(shown.contains("Delete Item: Buy water"));
        }
    }
}
