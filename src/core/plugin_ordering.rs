/*
 * Applies the user's saved plugin order and disabled set on top of the
 * discovered plugin list.
 *
 * Saved names are placed first, in saved order; a name listed more than once
 * only counts the first time, and stale names are ignored. Everything not
 * mentioned keeps its discovery order at the end, so newly added plugins are
 * never lost. The disabled filter runs after ordering, so disabling never
 * moves the remaining plugins relative to one another.
 *
 * Plugins sharing a name are all kept: the first one discovered takes the
 * saved position and the others stay at the end in discovery order.
 */
use super::plugin::PluginDescriptor;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

pub trait PluginName {
    fn plugin_name(&self) -> &str;
}

impl PluginName for PluginDescriptor {
    fn plugin_name(&self) -> &str {
        self.name()
    }
}

impl PluginName for String {
    fn plugin_name(&self) -> &str {
        self
    }
}

impl PluginName for &str {
    fn plugin_name(&self) -> &str {
        self
    }
}

pub fn apply_plugin_order<T: PluginName>(
    plugins: Vec<T>,
    saved_order: &[String],
    disabled: Option<&BTreeSet<String>>,
) -> Vec<T> {
    let mut slots: Vec<Option<T>> = plugins.into_iter().map(Some).collect();
    let mut indices_by_name: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (index, slot) in slots.iter().enumerate() {
        if let Some(plugin) = slot {
            indices_by_name
                .entry(plugin.plugin_name().to_string())
                .or_default()
                .push_back(index);
        }
    }

    let mut ordered = Vec::with_capacity(slots.len());
    let mut placed_names: HashSet<&str> = HashSet::new();
    for name in saved_order {
        if !placed_names.insert(name.as_str()) {
            continue;
        }
        let Some(index) = indices_by_name
            .get_mut(name)
            .and_then(|indices| indices.pop_front())
        else {
            continue;
        };
        if let Some(plugin) = slots[index].take() {
            ordered.push(plugin);
        }
    }
    ordered.extend(slots.into_iter().flatten());

    match disabled {
        Some(disabled) => ordered
            .into_iter()
            .filter(|plugin| !disabled.contains(plugin.plugin_name()))
            .collect(),
        None => ordered,
    }
}
