//! The analyst role: the single system prompt this client speaks with.

use crate::dataset::Dataset;

/// System prompt for the analyst role: the dataset schema plus the exact
/// surface the executor accepts. Kept deliberately narrow so generated
/// snippets stay inside what the sandbox can run.
pub fn analyst_role_text(dataset: &Dataset) -> String {
    format!(
        "You are a data analyst. A CSV file is already loaded as the dataframe `df`.\n\
        {schema}\n\
        Answer every question by writing a short code snippet that computes the answer from `df`.\n\
        You may use:\n\
        - df[\"column\"] with .mean() .sum() .min() .max() .std() .median() .count() .nunique()\n\
        - df.describe(), df.head(n), df.tail(n), df.shape, df.columns, len(df)\n\
        - plt.hist(values, bins=n), plt.bar(labels, values), plt.plot(xs, ys), plt.scatter(xs, ys)\n\
        - plt.title/xlabel/ylabel, print(), variables, and + - * / arithmetic\n\
        Print scalar answers with print(). For charts, call plt functions; do not call plt.show().\n\
        Do not use loops, conditionals, or function definitions.\n\
        Provide only code in plain text format without Markdown formatting.\n\
        Do not include symbols such as ``` or ```python.\n\
        You are not allowed to ask for more details.",
        schema = dataset.schema_preview(5)
    )
}
