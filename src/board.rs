use crate::models::{Quadrant, Task};

/// Canonical, ordered set of loaded tasks. Every view is derived from it.
#[derive(Default, Debug)]
pub struct TaskBoard {
    tasks: Vec<Task>,
}

impl TaskBoard {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Adds a freshly created task. A task with the same id is replaced in place.
    pub fn insert(&mut self, task: Task) {
        match self.position(&task.id) {
            Some(i) => self.tasks[i] = task,
            None => self.tasks.push(task),
        }
    }

    /// Returns false when no entry matches; the next full reload reconciles.
    pub fn apply_update(&mut self, id: &str, task: Task) -> bool {
        let Some(existing) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        existing.content = task.content;
        existing.completed = task.completed;
        // The update endpoint echoes the stored record, quadrant included.
        if task.quadrant.is_some() {
            existing.quadrant = task.quadrant;
            existing.urgency = task.urgency;
            existing.importance = task.importance;
        }
        if task.updated_at.is_some() {
            existing.updated_at = task.updated_at;
        }
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks.clear();
        for task in tasks {
            self.insert(task);
        }
    }

    /// Tasks grouped by quadrant in board order. Unsorted tasks are left out.
    pub fn quadrant_buckets(&self) -> [Vec<&Task>; 4] {
        let mut buckets: [Vec<&Task>; 4] = Default::default();
        for task in &self.tasks {
            if let Some(quadrant) = task.quadrant {
                buckets[quadrant.index()].push(task);
            }
        }
        buckets
    }

    pub fn bucket(&self, quadrant: Quadrant) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.quadrant == Some(quadrant))
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }
}
