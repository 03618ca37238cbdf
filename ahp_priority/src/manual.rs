/*!

This is the long-form manual for `ahp_priority` and `ahpp`.

## The method

A decision is described by a set of criteria and a set of alternatives. The
criteria are compared with each other in pairs, then the alternatives are
compared in pairs once per criterion. Each comparison answers the question
"how much more important (or preferred) is the row item compared to the
column item?" on the following scale:

| value      | meaning                 |
|------------|-------------------------|
| 1          | equal importance        |
| 3          | moderate importance     |
| 5          | strong importance       |
| 7          | very strong importance  |
| 9          | extreme importance      |
| 2, 4, 6, 8 | intermediate values     |
| 1/3 .. 1/9 | the reverse judgments   |

Only the upper triangle of a matrix needs to be filled: the lower triangle is
always recomputed as the reciprocal of the upper one, and the diagonal is 1.

From each matrix, the program derives a weight vector (each column is
normalized, then the rows are averaged) and a consistency ratio (CR). A CR
above 0.10 means that the judgments contradict each other too much; the
weights are still reported but the judgments should be revisited.

The final score of an alternative is the sum over the criteria of its weight
under the criterion multiplied by the weight of the criterion.

## Input formats

The following formats are supported for a comparison matrix:
* `csv` Comma Separated Values
* `xlsx` Excel workbook
* `json` judgments written directly in the configuration file

### `csv` and `xlsx`

The layout is the one of the spreadsheet template:

|                | Cost | Reliability | Sustainability |
|----------------|------|-------------|----------------|
| Cost           | 1    | 2           | 4              |
| Reliability    |      | 1           | 3              |
| Sustainability |      |             | 1              |

The first row holds the column labels and the first column the row labels.
The labels must be the ones declared for the criteria (or the alternatives), in
any order. Cells may hold numbers or fractions such as `1/3`. Empty cells are
unset judgments: they are allowed in the lower triangle only.

For Excel files, the first worksheet is used unless `excelWorksheetName` is
provided.

### `json`

Either a full matrix, listed in the order of the declared labels:

```text
{ "provider": "json", "matrix": [[1, 2, 4], [0, 1, 3], [0, 0, 1]] }
```

or a list of pairwise judgments:

```text
{ "provider": "json", "judgments": [
    { "a": "Cost", "b": "Reliability", "value": 2 },
    { "a": "Cost", "b": "Sustainability", "value": 4 },
    { "a": "Reliability", "b": "Sustainability", "value": 3 } ] }
```

A `json` source with a `filePath` reads the same object from that file.
Pairs that are not listed keep the neutral judgment 1. Judgments entered this
way must be on the 1/9 .. 9 scale unless `judgmentScale` is `unbounded`.

## Configuration

```text
{
  "outputSettings": { "modelName": "Microgrid site", "outputDirectory": "out" },
  "criteria": ["Cost", "Reliability", "Sustainability"],
  "alternatives": ["Site A", "Site B"],
  "criteriaSource": { "provider": "csv", "filePath": "criteria.csv" },
  "alternativeSources": [
    { "criterion": "Cost", "provider": "xlsx", "filePath": "alternatives.xlsx",
      "excelWorksheetName": "Cost" },
    { "criterion": "Reliability", "provider": "csv", "filePath": "reliability.csv" },
    { "criterion": "Sustainability", "provider": "json",
      "judgments": [{ "a": "Site A", "b": "Site B", "value": 3 }] }
  ],
  "rules": { "consistencyThreshold": 0.1, "judgmentScale": "saaty" }
}
```

File paths are relative to the directory of the configuration file.

FileSource options:
 - `firstRowIndex` (string or number, optional, default 1): the row that holds the column labels.
 - `firstColumnIndex` (string or number, optional, default 1): the column that holds the row
   labels. Excel-style letters (`A`, `B`, ...) are accepted.

## Outputs

- `--out <file>` or `--out stdout`: a summary in JSON with the weights and the consistency of
  every matrix, the global ranking and the best alternative.
- `--export-dir <dir>`: the comparison matrices, normalized matrices, weights, consistency
  figures and the final ranking as CSV tables.
- `--reference <file>`: compares the summary with a reference summary and fails on any difference.

 */
